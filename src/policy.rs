//! Regulatory timing policy.
//!
//! Everything that makes a transmission legal is data, not behavior: the
//! carrier-sense window, the busy threshold, the transmission ceiling, the
//! mandatory pause and the LBT retry budget. The two operating sub-bands
//! differ only in these numbers, so they are alternate [`RegulatoryPolicy`]
//! bundles over one scheduler rather than two code paths.

use crate::clock::Clock;
use crate::duty_cycle::DutyCycleLimiter;
use std::fmt;
use std::time::Duration;

/// Carrier-sense observation window in milliseconds (the regulatory floor).
pub const CARRIER_SENSE_MS: u32 = 5;

/// RSSI level at or above which the channel counts as occupied.
pub const BUSY_THRESHOLD_DBM: f32 = -80.0;

/// Minimum random backoff between busy probes, in milliseconds.
pub const BACKOFF_MIN_MS: u32 = 0;

/// Maximum random backoff between busy probes, in milliseconds.
pub const BACKOFF_MAX_MS: u32 = 50;

/// Total budget for LBT retries before giving up, in milliseconds.
pub const LBT_RETRY_WINDOW_MS: u32 = 100;

/// Operating segment of the 920 MHz band.
///
/// The segments share modulation and carrier-sense rules but differ in how
/// long a transmission may run and how long the transmitter must then stay
/// quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubBand {
    /// 920.5-923.5 MHz: up to 4 s on air, then at least 50 ms of silence.
    Low920,
    /// 923.5-928.1 MHz: up to 400 ms on air, then at least 2 ms of silence.
    High923,
}

impl SubBand {
    /// Maximum single-transmission time in milliseconds.
    pub fn max_tx_time_ms(self) -> u32 {
        match self {
            Self::Low920 => 4000,
            Self::High923 => 400,
        }
    }

    /// Minimum post-transmission off-time in milliseconds.
    pub fn min_off_time_ms(self) -> u32 {
        match self {
            Self::Low920 => 50,
            Self::High923 => 2,
        }
    }

    /// Cumulative airtime allowance as a percentage per hour.
    pub fn duty_cycle_percent(self) -> f32 {
        10.0
    }

    /// Token-bucket limiter for this sub-band's hourly airtime allowance.
    pub fn duty_cycle_limiter<C: Clock + ?Sized>(self, clock: &C) -> DutyCycleLimiter {
        DutyCycleLimiter::new(clock, self.duty_cycle_percent(), Duration::from_secs(3600))
    }

    /// The full timing policy for this sub-band.
    pub fn policy(self) -> RegulatoryPolicy {
        RegulatoryPolicy {
            carrier_sense_ms: CARRIER_SENSE_MS,
            busy_threshold_dbm: BUSY_THRESHOLD_DBM,
            max_tx_time_ms: self.max_tx_time_ms(),
            min_off_time_ms: self.min_off_time_ms(),
            backoff_min_ms: BACKOFF_MIN_MS,
            backoff_max_ms: BACKOFF_MAX_MS,
            lbt_retry_window_ms: LBT_RETRY_WINDOW_MS,
        }
    }
}

impl Default for SubBand {
    fn default() -> Self {
        #[cfg(feature = "subband-923-928")]
        return Self::High923;
        #[cfg(not(feature = "subband-923-928"))]
        Self::Low920
    }
}

/// Timing constants that make a transmission legal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegulatoryPolicy {
    /// How long one carrier-sense probe observes the channel (ms).
    pub carrier_sense_ms: u32,
    /// RSSI at or above this reads as a busy channel (dBm).
    pub busy_threshold_dbm: f32,
    /// Hard ceiling on a single transmission's airtime (ms).
    pub max_tx_time_ms: u32,
    /// Mandatory silence after every keyed transmission (ms).
    pub min_off_time_ms: u32,
    /// Lower bound of the random backoff between busy probes (ms).
    pub backoff_min_ms: u32,
    /// Upper bound of the random backoff between busy probes (ms).
    pub backoff_max_ms: u32,
    /// Total budget for LBT retries before reporting a busy channel (ms).
    pub lbt_retry_window_ms: u32,
}

impl Default for RegulatoryPolicy {
    fn default() -> Self {
        SubBand::default().policy()
    }
}

impl RegulatoryPolicy {
    /// Check the policy for self-consistency.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.carrier_sense_ms < CARRIER_SENSE_MS {
            return Err(PolicyError::InvalidConfig("carrier_sense_ms must be >= 5"));
        }
        if self.backoff_max_ms < self.backoff_min_ms {
            return Err(PolicyError::InvalidConfig(
                "backoff_max_ms must be >= backoff_min_ms",
            ));
        }
        // The retry window must fit at least one whole probe, or the
        // controller could never observe a free channel.
        if self.lbt_retry_window_ms < self.carrier_sense_ms {
            return Err(PolicyError::InvalidConfig(
                "lbt_retry_window_ms must be >= carrier_sense_ms",
            ));
        }
        if self.max_tx_time_ms == 0 {
            return Err(PolicyError::InvalidConfig("max_tx_time_ms must be > 0"));
        }
        if self.busy_threshold_dbm > -40.0 {
            return Err(PolicyError::InvalidConfig(
                "busy_threshold_dbm must be <= -40 dBm",
            ));
        }
        if self.busy_threshold_dbm < -140.0 {
            return Err(PolicyError::InvalidConfig(
                "busy_threshold_dbm must be >= -140 dBm",
            ));
        }
        Ok(())
    }
}

/// Errors from policy construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Invalid configuration parameter.
    InvalidConfig(&'static str),
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid policy: {}", msg),
        }
    }
}

impl std::error::Error for PolicyError {}
