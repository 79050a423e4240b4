//! Listen-before-talk retry control.
//!
//! [`acquire_channel`] probes until the channel is quiet, sleeping a
//! random backoff between busy probes. Randomized backoff desynchronizes
//! transmitters that would otherwise probe and key up in lockstep. The
//! retry window is a hard ceiling: under sustained contention the
//! controller gives up instead of retrying forever, so the caller always
//! gets control back.

use crate::carrier_sense::probe_once;
use crate::clock::{sleep_sliced, Clock};
use crate::driver::{ChannelActivity, DriverError, RadioDriver};
use crate::policy::RegulatoryPolicy;
use log::debug;
use rand_core::{OsRng, RngCore};

/// Slice granularity of the backoff sleep (ms).
const BACKOFF_SLICE_MS: u32 = 1;

/// Backoff jitter source.
///
/// A small LCG (Numerical Recipes parameters) is plenty for jitter and
/// keeps the sequence reproducible under test via [`new`].
///
/// [`new`]: BackoffRng::new
pub struct BackoffRng {
    state: u32,
}

impl BackoffRng {
    /// Deterministically seeded generator. A zero seed is bumped to keep
    /// the state nonzero.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Generator seeded from the operating system entropy source.
    pub fn from_entropy() -> Self {
        Self::new(OsRng.next_u32())
    }

    fn next(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(1664525)
            .wrapping_add(1013904223);
        self.state
    }

    /// Uniform draw from `min_ms..=max_ms`.
    pub fn backoff_ms(&mut self, min_ms: u32, max_ms: u32) -> u32 {
        if max_ms <= min_ms {
            return min_ms;
        }
        let span = max_ms - min_ms + 1;
        min_ms + self.next() % span
    }
}

/// Probe with randomized backoff until the channel is free or the retry
/// window closes.
///
/// `Ok(Free)` means the channel may be keyed now; a free probe returns
/// immediately, without any backoff sleep. `Ok(Busy)` means no quiet
/// window was found inside `lbt_retry_window_ms`. Driver faults propagate
/// immediately: they signal hardware trouble, not contention, and
/// retrying them would mask it.
pub fn acquire_channel<D, C>(
    driver: &mut D,
    clock: &C,
    policy: &RegulatoryPolicy,
    rng: &mut BackoffRng,
) -> Result<ChannelActivity, DriverError>
where
    D: RadioDriver + ?Sized,
    C: Clock + ?Sized,
{
    let start = clock.now_ms();
    loop {
        if probe_once(driver, clock, policy)? == ChannelActivity::Free {
            return Ok(ChannelActivity::Free);
        }
        if clock.now_ms().saturating_sub(start) >= policy.lbt_retry_window_ms as u64 {
            debug!(
                "no quiet window within {} ms, giving up",
                policy.lbt_retry_window_ms
            );
            return Ok(ChannelActivity::Busy);
        }
        let backoff = rng.backoff_ms(policy.backoff_min_ms, policy.backoff_max_ms);
        debug!("channel busy, backing off {} ms", backoff);
        sleep_sliced(clock, backoff as u64, BACKOFF_SLICE_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::policy::SubBand;

    struct FakeRadio {
        rssi_dbm: f32,
        probes: usize,
    }

    impl FakeRadio {
        fn new(rssi_dbm: f32) -> Self {
            Self {
                rssi_dbm,
                probes: 0,
            }
        }
    }

    impl RadioDriver for FakeRadio {
        fn standby(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        fn start_receive(&mut self) -> Result<(), DriverError> {
            self.probes += 1;
            Ok(())
        }

        fn instant_rssi_dbm(&mut self) -> f32 {
            self.rssi_dbm
        }

        fn transmit(&mut self, _payload: &[u8]) -> Result<(), DriverError> {
            Ok(())
        }
    }

    struct BrokenScanner;

    impl RadioDriver for BrokenScanner {
        fn standby(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        fn start_receive(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        fn instant_rssi_dbm(&mut self) -> f32 {
            -120.0
        }

        fn supports_channel_scan(&self) -> bool {
            true
        }

        fn scan_channel(&mut self) -> Result<ChannelActivity, DriverError> {
            Err(DriverError::ChipNotFound)
        }

        fn transmit(&mut self, _payload: &[u8]) -> Result<(), DriverError> {
            Ok(())
        }
    }

    #[test]
    fn test_free_channel_needs_one_probe_and_no_backoff() {
        let mut radio = FakeRadio::new(-120.0);
        let clock = ManualClock::new();
        let policy = SubBand::Low920.policy();
        let mut rng = BackoffRng::new(42);

        let result = acquire_channel(&mut radio, &clock, &policy, &mut rng);
        assert_eq!(result, Ok(ChannelActivity::Free));
        assert_eq!(radio.probes, 1);
        // One carrier-sense window plus the settle tick, nothing more.
        assert!(clock.now_ms() <= policy.carrier_sense_ms as u64 + 1);
    }

    #[test]
    fn test_busy_channel_gives_up_only_after_window() {
        let mut radio = FakeRadio::new(-50.0);
        let clock = ManualClock::new();
        let policy = SubBand::Low920.policy();
        let mut rng = BackoffRng::new(42);

        let result = acquire_channel(&mut radio, &clock, &policy, &mut rng);
        assert_eq!(result, Ok(ChannelActivity::Busy));
        assert!(
            clock.now_ms() >= policy.lbt_retry_window_ms as u64,
            "gave up after {} ms, before the {} ms window",
            clock.now_ms(),
            policy.lbt_retry_window_ms
        );
        assert!(radio.probes > 1);
    }

    #[test]
    fn test_driver_error_propagates_without_retry() {
        let mut radio = BrokenScanner;
        let clock = ManualClock::new();
        let policy = SubBand::Low920.policy();
        let mut rng = BackoffRng::new(42);

        let result = acquire_channel(&mut radio, &clock, &policy, &mut rng);
        assert_eq!(result, Err(DriverError::ChipNotFound));
        // No backoff, no retry window: the fault surfaced immediately.
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn test_backoff_within_inclusive_bounds() {
        let mut rng = BackoffRng::new(12345);
        for _ in 0..1000 {
            let ms = rng.backoff_ms(0, 50);
            assert!(ms <= 50);
        }
        let mut rng = BackoffRng::new(12345);
        for _ in 0..1000 {
            let ms = rng.backoff_ms(10, 20);
            assert!((10..=20).contains(&ms));
        }
    }

    #[test]
    fn test_backoff_degenerate_range() {
        let mut rng = BackoffRng::new(7);
        assert_eq!(rng.backoff_ms(25, 25), 25);
    }

    #[test]
    fn test_backoff_deterministic_with_same_seed() {
        let mut a = BackoffRng::new(99);
        let mut b = BackoffRng::new(99);
        for _ in 0..20 {
            assert_eq!(a.backoff_ms(0, 50), b.backoff_ms(0, 50));
        }
    }

    #[test]
    fn test_zero_seed_converted_to_one() {
        let mut a = BackoffRng::new(0);
        let mut b = BackoffRng::new(1);
        for _ in 0..20 {
            assert_eq!(a.backoff_ms(0, 50), b.backoff_ms(0, 50));
        }
    }
}
