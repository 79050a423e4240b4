//! LoRa time-on-air estimation.
//!
//! [`time_on_air_ms`] implements the LoRa modem timing formula from the
//! Semtech SX126x datasheet for explicit-header packets with CRC, the only
//! packet shape the transmit path produces. The estimate drives both the
//! pre-flight length check and the post-transmit airtime wait.

use crate::config::RadioConfig;
use crate::policy::RegulatoryPolicy;

/// Estimated on-air duration for a payload, in fractional milliseconds.
///
/// Pure and deterministic. Callers that need an integer wait round up,
/// never down, so the channel is never released early.
pub fn time_on_air_ms(payload_len: usize, cfg: &RadioConfig) -> f64 {
    let bw = cfg.bandwidth_hz as f64;
    if bw == 0.0 {
        return 0.0;
    }

    let sf = cfg.spreading_factor as f64;
    let t_sym_ms = (1u64 << cfg.spreading_factor) as f64 * 1000.0 / bw;
    let t_preamble_ms = (cfg.preamble_symbols as f64 + 4.25) * t_sym_ms;

    let de = if cfg.low_data_rate_optimize() { 1.0 } else { 0.0 };

    // Explicit header, CRC on: fixed properties of the transmit path.
    let numerator = 8.0 * payload_len as f64 - 4.0 * sf + 28.0 + 16.0;
    // The coding-rate multiplier in the formula is (CR + 4) with
    // CR = denominator - 4, which is the denominator itself.
    let denominator = 4.0 * (sf - 2.0 * de);

    // A degenerate SF/DE combination zeroes the denominator; the payload
    // term drops out and only the 8-symbol minimum remains.
    let n_payload = if denominator > 0.0 {
        8.0 + ((numerator / denominator).ceil() * cfg.coding_rate as f64).max(0.0)
    } else {
        8.0
    };

    t_preamble_ms + n_payload * t_sym_ms
}

/// Whether a payload's estimated airtime fits inside the policy's maximum
/// transmission time.
///
/// Runs strictly before any channel sensing or transmit side effect;
/// rejecting a packet after occupying the channel would waste the airtime
/// the check exists to protect.
pub fn within_max_tx_time(
    payload_len: usize,
    cfg: &RadioConfig,
    policy: &RegulatoryPolicy,
) -> bool {
    time_on_air_ms(payload_len, cfg) <= policy.max_tx_time_ms as f64
}
