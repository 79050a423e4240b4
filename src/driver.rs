//! Radio driver capability.
//!
//! The scheduler drives the transceiver exclusively through [`RadioDriver`].
//! Register-level control, SPI wiring, antenna switching and the board
//! bring-up ritual all live behind this trait; an implementation hands the
//! scheduler an already-initialized radio.

use std::fmt;

/// Channel occupancy as reported by one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelActivity {
    /// Nothing above the busy threshold was heard.
    Free,
    /// A carrier or preamble was detected.
    Busy,
}

/// Driver-level fault codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The transceiver did not respond.
    ChipNotFound,
    /// The payload exceeds what the PHY carries in one packet.
    PacketTooLong,
    /// The transmit-complete interrupt never fired.
    TxTimeout,
    /// No packet arrived within the receive window.
    RxTimeout,
    /// Payload CRC check failed.
    CrcMismatch,
    /// The driver does not support the requested operation.
    Unsupported,
    /// Any other driver-specific code, passed through verbatim.
    Other(i16),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChipNotFound => write!(f, "chip not found"),
            Self::PacketTooLong => write!(f, "packet too long"),
            Self::TxTimeout => write!(f, "TX timeout"),
            Self::RxTimeout => write!(f, "RX timeout"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::Unsupported => write!(f, "unsupported operation"),
            Self::Other(code) => write!(f, "driver error {}", code),
        }
    }
}

impl std::error::Error for DriverError {}

/// Control surface of a half-duplex LoRa transceiver.
///
/// The radio is a single exclusively-owned resource. Every path in this
/// crate that takes it out of standby (carrier sensing, transmitting) puts
/// it back before returning, on success and on failure, so the next caller
/// always finds it idle.
pub trait RadioDriver {
    /// Put the radio into standby.
    fn standby(&mut self) -> Result<(), DriverError>;

    /// Enter continuous receive mode, used for RSSI carrier sensing.
    fn start_receive(&mut self) -> Result<(), DriverError>;

    /// Instantaneous RSSI in dBm. Only meaningful while in receive mode.
    fn instant_rssi_dbm(&mut self) -> f32;

    /// Whether the hardware offers single-shot channel activity detection.
    ///
    /// Drivers returning `true` must also implement [`scan_channel`].
    ///
    /// [`scan_channel`]: RadioDriver::scan_channel
    fn supports_channel_scan(&self) -> bool {
        false
    }

    /// One hardware channel-activity scan.
    fn scan_channel(&mut self) -> Result<ChannelActivity, DriverError> {
        Err(DriverError::Unsupported)
    }

    /// Transmit one payload, blocking until the driver reports completion
    /// or failure.
    ///
    /// [`DriverError::TxTimeout`] is the distinguished "completion
    /// interrupt missed" code; the scheduler treats it as a probable
    /// success after waiting out the estimated airtime.
    fn transmit(&mut self, payload: &[u8]) -> Result<(), DriverError>;
}
