//! Tick duration measurement.
//!
//! Every control tick has a fixed period; the work done inside it must finish
//! well before the next one is due. `TickTimer` measures a single tick and
//! `TickStats` accumulates totals so overruns can be reported.

use std::time::{Duration, Instant};

/// Measures one tick against its budget.
pub struct TickTimer {
    start: Instant,
    budget: Duration,
}

impl TickTimer {
    /// Start timing a tick that must complete within `budget`.
    pub fn start(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    /// Stop the timer, returning the elapsed time and whether the budget was exceeded.
    pub fn stop(self) -> (Duration, bool) {
        let elapsed = self.start.elapsed();
        (elapsed, elapsed > self.budget)
    }
}

/// Accumulated tick timing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickStats {
    pub ticks: u64,
    pub overruns: u64,
    pub total: Duration,
    pub worst: Duration,
}

impl TickStats {
    /// Record one measured tick.
    pub fn record(&mut self, elapsed: Duration, overrun: bool) {
        self.ticks += 1;
        self.total += elapsed;
        if elapsed > self.worst {
            self.worst = elapsed;
        }
        if overrun {
            self.overruns += 1;
        }
    }

    /// Average tick duration, zero before the first tick.
    pub fn average(&self) -> Duration {
        if self.ticks == 0 {
            Duration::ZERO
        } else {
            self.total.div_f64(self.ticks as f64)
        }
    }
}
