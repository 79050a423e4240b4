//! Radio link configuration.
//!
//! [`RadioConfig`] captures the modulation parameters of one LoRa link.
//! Both ends of a link must be configured identically; that is an external
//! contract between the stations, not something this crate can verify over
//! the air.

/// Maximum payload the SX126x-class PHY carries in one packet.
pub const MAX_PAYLOAD_LEN: usize = 255;

/// LoRa link parameters, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadioConfig {
    /// Carrier frequency in Hz.
    pub frequency_hz: u32,
    /// Bandwidth in Hz (typically 125000, 250000, or 500000).
    pub bandwidth_hz: u32,
    /// Spreading factor (7-12).
    pub spreading_factor: u8,
    /// Coding rate denominator (5-8 for 4/5 to 4/8).
    pub coding_rate: u8,
    /// Preamble length in symbols.
    pub preamble_symbols: u16,
    /// Sync word.
    pub sync_word: u8,
    /// TX power in dBm.
    pub tx_power_dbm: i8,
    /// TCXO control voltage in volts.
    pub tcxo_voltage: f32,
    /// Whether the chip runs from the LDO regulator instead of the DC-DC converter.
    pub use_ldo: bool,
}

impl Default for RadioConfig {
    /// Defaults for the 920 MHz band link this crate was written against.
    fn default() -> Self {
        Self {
            frequency_hz: 921_600_000,
            bandwidth_hz: 125_000,
            spreading_factor: 7,
            coding_rate: 5, // 4/5
            preamble_symbols: 20,
            sync_word: 0x34,
            tx_power_dbm: 13,
            tcxo_voltage: 3.0,
            use_ldo: true,
        }
    }
}

impl RadioConfig {
    /// Symbol duration in microseconds.
    pub fn symbol_duration_us(&self) -> u64 {
        // T_sym = 2^SF / BW (in seconds)
        let bw = self.bandwidth_hz as u64;
        if bw == 0 {
            return 0;
        }
        (1u64 << self.spreading_factor) * 1_000_000 / bw
    }

    /// Whether low data rate optimization is in effect.
    ///
    /// Enabled for SF11 and up at 125 kHz or narrower, matching what the
    /// transmit path programs into the modem.
    pub fn low_data_rate_optimize(&self) -> bool {
        self.spreading_factor >= 11 && self.bandwidth_hz <= 125_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = RadioConfig::default();
        assert_eq!(cfg.frequency_hz, 921_600_000);
        assert_eq!(cfg.bandwidth_hz, 125_000);
        assert_eq!(cfg.spreading_factor, 7);
        assert_eq!(cfg.coding_rate, 5);
        assert_eq!(cfg.preamble_symbols, 20);
        assert_eq!(cfg.sync_word, 0x34);
        assert_eq!(cfg.tx_power_dbm, 13);
        assert!(cfg.use_ldo);
    }

    #[test]
    fn test_symbol_duration_sf7_125khz() {
        let cfg = RadioConfig::default();
        // 2^7 / 125000 = 0.001024 seconds = 1024 us
        assert_eq!(cfg.symbol_duration_us(), 1024);
    }

    #[test]
    fn test_symbol_duration_sf12_125khz() {
        let cfg = RadioConfig {
            spreading_factor: 12,
            ..Default::default()
        };
        assert_eq!(cfg.symbol_duration_us(), 32768);
    }

    #[test]
    fn test_symbol_duration_sf7_500khz() {
        let cfg = RadioConfig {
            bandwidth_hz: 500_000,
            ..Default::default()
        };
        assert_eq!(cfg.symbol_duration_us(), 256);
    }

    #[test]
    fn test_zero_bandwidth_is_safe() {
        let cfg = RadioConfig {
            bandwidth_hz: 0,
            ..Default::default()
        };
        assert_eq!(cfg.symbol_duration_us(), 0);
    }

    #[test]
    fn test_low_data_rate_optimize_rule() {
        // SF7 at 125 kHz: off
        assert!(!RadioConfig::default().low_data_rate_optimize());

        // SF11 at 125 kHz: on
        let cfg = RadioConfig {
            spreading_factor: 11,
            ..Default::default()
        };
        assert!(cfg.low_data_rate_optimize());

        // SF12 at 250 kHz: off, the rule keys on bandwidth, not symbol time
        let cfg = RadioConfig {
            spreading_factor: 12,
            bandwidth_hz: 250_000,
            ..Default::default()
        };
        assert!(!cfg.low_data_rate_optimize());
    }
}
