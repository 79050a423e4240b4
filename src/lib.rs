//! Regulatory-compliant LoRa transmission scheduling.
//!
//! Shared sub-GHz bands require a transmitter to listen before talking,
//! bound how long it talks, and stay silent for a minimum interval
//! afterwards. This crate implements that compliance core for LoRa links:
//!
//! - [`airtime`]: modulation-accurate time-on-air estimation and the
//!   pre-flight length check
//! - [`carrier_sense`]: bounded channel occupancy probes (RSSI sweep or
//!   hardware channel-activity detection)
//! - [`lbt`]: listen-before-talk retries with randomized backoff
//! - [`scheduler`]: the transmission orchestrator enforcing the airtime
//!   wait and the mandatory off-time
//! - [`policy`]: regulatory timing constants, bundled per sub-band
//! - [`duty_cycle`]: hourly airtime budget for callers that track it
//!
//! Hardware stays behind the [`RadioDriver`] trait and time behind the
//! [`Clock`] trait, so the whole scheduler runs and tests on the host.
//!
//! # Example
//!
//! ```
//! use lora_lbt::{DriverError, ManualClock, RadioConfig, RadioDriver, SubBand, Transmitter};
//!
//! struct QuietRadio;
//!
//! impl RadioDriver for QuietRadio {
//!     fn standby(&mut self) -> Result<(), DriverError> {
//!         Ok(())
//!     }
//!     fn start_receive(&mut self) -> Result<(), DriverError> {
//!         Ok(())
//!     }
//!     fn instant_rssi_dbm(&mut self) -> f32 {
//!         -120.0
//!     }
//!     fn transmit(&mut self, _payload: &[u8]) -> Result<(), DriverError> {
//!         Ok(())
//!     }
//! }
//!
//! let policy = SubBand::Low920.policy();
//! let mut tx = Transmitter::new(QuietRadio, ManualClock::new(), RadioConfig::default(), policy)
//!     .expect("sub-band policies are self-consistent");
//!
//! let outcome = tx.transmit(b"hello", 10);
//! assert!(outcome.is_sent());
//! ```

pub mod airtime;
pub mod carrier_sense;
pub mod clock;
pub mod config;
pub mod driver;
pub mod duty_cycle;
pub mod lbt;
pub mod policy;
pub mod scheduler;

// Re-export commonly used items
pub use airtime::{time_on_air_ms, within_max_tx_time};
pub use carrier_sense::probe_once;
pub use clock::{sleep_sliced, Clock, ManualClock, SystemClock};
pub use config::{RadioConfig, MAX_PAYLOAD_LEN};
pub use driver::{ChannelActivity, DriverError, RadioDriver};
pub use duty_cycle::DutyCycleLimiter;
pub use lbt::{acquire_channel, BackoffRng};
pub use policy::{PolicyError, RegulatoryPolicy, SubBand};
pub use scheduler::{AttemptOutcome, Transmitter};
