//! Transmission orchestration.
//!
//! [`Transmitter`] sequences one legal transmission attempt: length check,
//! listen-before-talk, the transmit call itself, an airtime wait sized by
//! the time-on-air estimate, and the mandatory post-transmission pause.
//! Legality is the only guarantee; delivery is the link layer's problem.

use crate::airtime::time_on_air_ms;
use crate::clock::{sleep_sliced, Clock};
use crate::config::RadioConfig;
use crate::driver::{ChannelActivity, DriverError, RadioDriver};
use crate::lbt::{acquire_channel, BackoffRng};
use crate::policy::{PolicyError, RegulatoryPolicy};
use log::{debug, warn};

/// Slice granularity of the airtime wait (ms).
const TOA_WAIT_SLICE_MS: u32 = 10;

/// Slice granularity of the off-time pause (ms).
const OFF_TIME_SLICE_MS: u32 = 1;

/// Classified result of one transmission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "an unchecked outcome may hide a rejected or failed transmission"]
pub enum AttemptOutcome {
    /// The driver reported a completed transmission.
    Sent,
    /// The driver reported a TX timeout, treated as a missed completion
    /// interrupt rather than a failed transmission.
    SentAfterTimeoutIgnored,
    /// The payload's airtime exceeds the maximum transmission time. Shrink
    /// or split the payload; retrying unchanged cannot succeed.
    RejectedTooLong,
    /// No quiet window was found within the LBT retry budget. The whole
    /// attempt may be retried later.
    ChannelBusy,
    /// The driver reported a fault, passed through verbatim.
    DriverError(DriverError),
}

impl AttemptOutcome {
    /// Whether the payload is assumed to have left the antenna.
    pub fn is_sent(self) -> bool {
        matches!(self, Self::Sent | Self::SentAfterTimeoutIgnored)
    }
}

/// Half-duplex transmission scheduler for one exclusively-owned radio.
///
/// The radio must be initialized (reset ritual done, modem programmed to
/// match [`RadioConfig`]) before it is handed over. The scheduler holds no
/// state between [`transmit`] calls other than the backoff generator; all
/// deadlines are local to a single call.
///
/// If several logical transmitters share one radio, serialize their calls
/// externally; the scheduler assumes exactly one transmission in flight.
///
/// [`transmit`]: Transmitter::transmit
pub struct Transmitter<D, C> {
    driver: D,
    clock: C,
    config: RadioConfig,
    policy: RegulatoryPolicy,
    backoff: BackoffRng,
}

impl<D: RadioDriver, C: Clock> Transmitter<D, C> {
    /// Build a scheduler over an initialized radio.
    ///
    /// Fails if the policy is not self-consistent.
    pub fn new(
        driver: D,
        clock: C,
        config: RadioConfig,
        policy: RegulatoryPolicy,
    ) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self {
            driver,
            clock,
            config,
            policy,
            backoff: BackoffRng::from_entropy(),
        })
    }

    /// Replace the backoff generator with a deterministically seeded one.
    pub fn seed_backoff(&mut self, seed: u32) {
        self.backoff = BackoffRng::new(seed);
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn policy(&self) -> &RegulatoryPolicy {
        &self.policy
    }

    /// The scheduler's clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Access the underlying driver, for example to receive between
    /// transmissions.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Release the underlying driver.
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Perform one legal transmission attempt.
    ///
    /// `extra_margin_ms` pads the airtime wait to absorb estimate error on
    /// marginal links. The call blocks cooperatively (see
    /// [`sleep_sliced`]) through the airtime wait and the mandatory
    /// off-time before returning; there is no mid-attempt cancellation.
    pub fn transmit(&mut self, payload: &[u8], extra_margin_ms: u32) -> AttemptOutcome {
        // The length check comes first: an oversized payload must be
        // rejected before the radio is touched at all.
        let toa_ms = time_on_air_ms(payload.len(), &self.config);
        if toa_ms > self.policy.max_tx_time_ms as f64 {
            warn!(
                "rejecting {} B payload: {:.1} ms airtime exceeds the {} ms ceiling",
                payload.len(),
                toa_ms,
                self.policy.max_tx_time_ms
            );
            return AttemptOutcome::RejectedTooLong;
        }

        // Start the probe from a known idle state.
        if let Err(e) = self.driver.standby() {
            return AttemptOutcome::DriverError(e);
        }

        match acquire_channel(&mut self.driver, &self.clock, &self.policy, &mut self.backoff) {
            Ok(ChannelActivity::Free) => {}
            Ok(ChannelActivity::Busy) => {
                warn!(
                    "channel busy for {} ms, not transmitting",
                    self.policy.lbt_retry_window_ms
                );
                return AttemptOutcome::ChannelBusy;
            }
            Err(e) => return AttemptOutcome::DriverError(e),
        }

        // Carrier sensing can leave residual receive-mode state behind.
        if let Err(e) = self.driver.standby() {
            return AttemptOutcome::DriverError(e);
        }

        debug!(
            "transmitting {} B, estimated {:.1} ms on air",
            payload.len(),
            toa_ms
        );
        let result = self.driver.transmit(payload);

        // The completion interrupt is not trusted. On success or timeout,
        // wait out the estimated airtime so the off-time that follows is
        // measured from the true end of transmission.
        if matches!(result, Ok(()) | Err(DriverError::TxTimeout)) {
            let wait_ms = toa_ms.ceil() as u64 + extra_margin_ms as u64;
            sleep_sliced(&self.clock, wait_ms, TOA_WAIT_SLICE_MS);
        }

        // Mandatory pause between any two keyed transmissions, owed even
        // when the transmit call failed outright.
        sleep_sliced(
            &self.clock,
            self.policy.min_off_time_ms as u64,
            OFF_TIME_SLICE_MS,
        );

        match result {
            Ok(()) => AttemptOutcome::Sent,
            Err(DriverError::TxTimeout) => {
                warn!("TX timeout ignored; assuming the packet left the antenna");
                AttemptOutcome::SentAfterTimeoutIgnored
            }
            Err(e) => AttemptOutcome::DriverError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::policy::SubBand;

    struct QuietRadio;

    impl RadioDriver for QuietRadio {
        fn standby(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        fn start_receive(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        fn instant_rssi_dbm(&mut self) -> f32 {
            -120.0
        }

        fn transmit(&mut self, _payload: &[u8]) -> Result<(), DriverError> {
            Ok(())
        }
    }

    #[test]
    fn test_new_rejects_inconsistent_policy() {
        let mut policy = SubBand::Low920.policy();
        policy.backoff_min_ms = 100;
        policy.backoff_max_ms = 10;

        let result = Transmitter::new(
            QuietRadio,
            ManualClock::new(),
            RadioConfig::default(),
            policy,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_outcome_classification() {
        assert!(AttemptOutcome::Sent.is_sent());
        assert!(AttemptOutcome::SentAfterTimeoutIgnored.is_sent());
        assert!(!AttemptOutcome::RejectedTooLong.is_sent());
        assert!(!AttemptOutcome::ChannelBusy.is_sent());
        assert!(!AttemptOutcome::DriverError(DriverError::CrcMismatch).is_sent());
    }
}
