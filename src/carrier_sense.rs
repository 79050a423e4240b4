//! Channel occupancy probing.
//!
//! One probe is a bounded observation of the channel: either an RSSI sweep
//! over the carrier-sense window, or the driver's own single-shot channel
//! activity detection when the hardware offers one. Both strategies park
//! the radio back in standby on every exit path so the backoff delay and
//! the transmit call that follow always find it idle.

use crate::clock::Clock;
use crate::driver::{ChannelActivity, DriverError, RadioDriver};
use crate::policy::RegulatoryPolicy;
use log::debug;

/// Sampling granularity of the RSSI sweep and the scan retry loop (ms).
const POLL_INTERVAL_MS: u32 = 1;

/// Observe the channel once for the policy's carrier-sense window.
pub fn probe_once<D, C>(
    driver: &mut D,
    clock: &C,
    policy: &RegulatoryPolicy,
) -> Result<ChannelActivity, DriverError>
where
    D: RadioDriver + ?Sized,
    C: Clock + ?Sized,
{
    if driver.supports_channel_scan() {
        scan_probe(driver, clock, policy)
    } else {
        rssi_probe(driver, clock, policy)
    }
}

/// RSSI sweep: listen for the whole window and compare the peak reading
/// against the busy threshold.
fn rssi_probe<D, C>(
    driver: &mut D,
    clock: &C,
    policy: &RegulatoryPolicy,
) -> Result<ChannelActivity, DriverError>
where
    D: RadioDriver + ?Sized,
    C: Clock + ?Sized,
{
    // Failing to enter receive mode leaves the channel state unknown.
    // Silence is the conservative reading: report busy, not a fault.
    // The cost is that a genuinely broken radio shows up as a congested
    // channel instead of a driver error.
    if driver.start_receive().is_err() {
        let _ = driver.standby();
        clock.sleep_ms(1);
        return Ok(ChannelActivity::Busy);
    }

    let start = clock.now_ms();
    let mut peak_dbm = f32::NEG_INFINITY;
    while clock.now_ms().saturating_sub(start) < policy.carrier_sense_ms as u64 {
        let rssi = driver.instant_rssi_dbm();
        if rssi > peak_dbm {
            peak_dbm = rssi;
        }
        clock.sleep_ms(POLL_INTERVAL_MS);
        clock.yield_now();
    }

    driver.standby()?;
    clock.sleep_ms(1);

    if peak_dbm >= policy.busy_threshold_dbm {
        debug!("carrier sense: busy, peak {:.0} dBm", peak_dbm);
        Ok(ChannelActivity::Busy)
    } else {
        Ok(ChannelActivity::Free)
    }
}

/// Hardware channel-activity detection: retry single-shot scans until the
/// window elapses or the scan reports something other than busy.
fn scan_probe<D, C>(
    driver: &mut D,
    clock: &C,
    policy: &RegulatoryPolicy,
) -> Result<ChannelActivity, DriverError>
where
    D: RadioDriver + ?Sized,
    C: Clock + ?Sized,
{
    let start = clock.now_ms();
    loop {
        match driver.scan_channel() {
            Ok(ChannelActivity::Free) => {
                driver.standby()?;
                return Ok(ChannelActivity::Free);
            }
            Ok(ChannelActivity::Busy) => {
                if clock.now_ms().saturating_sub(start) >= policy.carrier_sense_ms as u64 {
                    debug!("channel scan: busy for the whole window");
                    driver.standby()?;
                    return Ok(ChannelActivity::Busy);
                }
                clock.sleep_ms(POLL_INTERVAL_MS);
                clock.yield_now();
            }
            Err(e) => {
                let _ = driver.standby();
                return Err(e);
            }
        }
    }
}
