//! Sampled execution primitives for the control tick.
//!
//! The regulation tick runs at a fixed period. Between ticks, outputs are held
//! constant (zero-order hold) and command handling may run freely.

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Tick configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Tick period in milliseconds.
    pub period_ms: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self { period_ms: 1000 }
    }
}

impl SampleConfig {
    /// Create a new tick configuration.
    ///
    /// # Errors
    ///
    /// Returns error if `period_ms` is zero.
    pub fn new(period_ms: u64) -> ControlResult<Self> {
        if period_ms == 0 {
            return Err(ControlError::InvalidArg {
                what: "tick period must be positive",
            });
        }
        Ok(Self { period_ms })
    }

    /// Tick period in seconds, the fixed `dt` of the control laws.
    pub fn dt(&self) -> f64 {
        self.period_ms as f64 / 1000.0
    }
}

/// Sample clock tracks when the next tick is due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    /// Tick configuration.
    pub config: SampleConfig,
    /// Time of next scheduled tick.
    pub next_due_ms: u64,
}

impl SampleClock {
    /// Create a clock whose first tick is due one period after `now_ms`.
    pub fn new(config: SampleConfig, now_ms: u64) -> Self {
        Self {
            config,
            next_due_ms: now_ms + config.period_ms,
        }
    }

    /// Check if a tick is due at `now_ms`.
    pub fn should_sample(&self, now_ms: u64) -> bool {
        now_ms >= self.next_due_ms
    }

    /// Advance to the next tick.
    ///
    /// If the caller fell more than one period behind, the schedule is
    /// re-anchored on `now_ms` instead of bursting through missed ticks.
    pub fn advance(&mut self, now_ms: u64) {
        self.next_due_ms += self.config.period_ms;
        if self.next_due_ms <= now_ms {
            self.next_due_ms = now_ms + self.config.period_ms;
        }
    }

    /// Time until the next tick.
    pub fn time_until_sample(&self, now_ms: u64) -> u64 {
        self.next_due_ms.saturating_sub(now_ms)
    }
}
