//! Airtime duty-cycle budgeting.
//!
//! Long-term complement to the per-transmission rules: the band also caps
//! cumulative airtime (10% per hour in the 920 MHz band). The limiter is
//! a token bucket whose budget refills continuously over the window, so
//! bursts are allowed while the hourly average stays compliant.
//!
//! The limiter is not wired into [`Transmitter`]: callers that need it
//! check the budget before invoking the scheduler and skip the attempt
//! when it is exhausted.
//!
//! [`Transmitter`]: crate::scheduler::Transmitter
//!
//! # Example
//!
//! ```
//! use lora_lbt::{ManualClock, SubBand};
//!
//! let clock = ManualClock::new();
//! let mut limiter = SubBand::Low920.duty_cycle_limiter(&clock);
//!
//! let airtime_ms = 69; // one 20-byte packet at SF7
//! if limiter.try_consume(&clock, airtime_ms) {
//!     // transmit
//! } else {
//!     // budget exhausted, hold the packet
//! }
//! ```

use crate::clock::Clock;
use std::time::Duration;

/// Token-bucket airtime limiter.
pub struct DutyCycleLimiter {
    /// Total allowed airtime per window (ms).
    budget_ms: u64,
    /// Remaining budget (ms).
    remaining_ms: u64,
    /// Clock timestamp of the last refill.
    last_refill_ms: u64,
    /// Window over which the duty cycle is measured (ms).
    window_ms: u64,
}

impl DutyCycleLimiter {
    /// A budget of `duty_cycle_percent` of `window` worth of airtime.
    pub fn new<C: Clock + ?Sized>(clock: &C, duty_cycle_percent: f32, window: Duration) -> Self {
        let window_ms = window.as_millis() as u64;
        let budget_ms = (window_ms as f64 * duty_cycle_percent as f64 / 100.0) as u64;
        Self {
            budget_ms,
            remaining_ms: budget_ms,
            last_refill_ms: clock.now_ms(),
            window_ms,
        }
    }

    /// Consume `airtime_ms` of budget.
    ///
    /// Returns `false`, leaving the budget unchanged, when the remaining
    /// budget cannot cover the airtime.
    pub fn try_consume<C: Clock + ?Sized>(&mut self, clock: &C, airtime_ms: u64) -> bool {
        self.refill(clock.now_ms());
        if self.remaining_ms >= airtime_ms {
            self.remaining_ms -= airtime_ms;
            true
        } else {
            false
        }
    }

    /// Remaining budget in milliseconds.
    pub fn remaining_ms<C: Clock + ?Sized>(&mut self, clock: &C) -> u64 {
        self.refill(clock.now_ms());
        self.remaining_ms
    }

    /// Maximum budget in milliseconds.
    pub fn budget_ms(&self) -> u64 {
        self.budget_ms
    }

    /// Refill proportionally to the time elapsed since the last refill.
    fn refill(&mut self, now_ms: u64) {
        if self.window_ms == 0 {
            return;
        }
        let elapsed = now_ms.saturating_sub(self.last_refill_ms);
        // u128 keeps the intermediate product from overflowing.
        let refill = (self.budget_ms as u128 * elapsed as u128 / self.window_ms as u128) as u64;
        if refill > 0 {
            self.remaining_ms = (self.remaining_ms + refill).min(self.budget_ms);
            self.last_refill_ms = now_ms;
        }
    }
}
