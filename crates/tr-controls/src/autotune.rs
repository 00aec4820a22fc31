//! Relay-feedback auto-tuning.
//!
//! While a session runs, the channel output is a relay: `step` while the
//! measurement is at or below the setpoint, `0` while above. The extreme
//! value of each completed half-cycle is kept as the latest high or low peak.
//! When the session duration has elapsed, the oscillation amplitude gives the
//! ultimate gain and the session duration is taken as the ultimate period:
//!
//! ```text
//! A  = (peak_high - peak_low) / 2
//! Ku = 4 * step / (pi * A)
//! kp = 0.6 * Ku,  ki = 1.2 * Ku / Pu,  kd = 0.075 * Ku * Pu
//! ```
//!
//! A session that never completes a half-cycle keeps both peaks at the
//! setpoint, so its amplitude is zero and it fails instead of producing
//! unbounded gains.

use serde::{Deserialize, Serialize};

use crate::controller::PidGains;
use crate::error::{ControlError, ControlResult};

/// Default session duration: 30 minutes.
pub const DEFAULT_SESSION_MS: u64 = 30 * 60 * 1000;

/// Auto-tune parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutotuneConfig {
    /// Relay output while below the setpoint.
    pub step: f64,
    /// Session length in milliseconds; also the assumed ultimate period.
    pub session_ms: u64,
    /// Smallest oscillation amplitude accepted as a real oscillation.
    pub min_amplitude: f64,
}

impl Default for AutotuneConfig {
    fn default() -> Self {
        Self {
            step: 255.0,
            session_ms: DEFAULT_SESSION_MS,
            min_amplitude: 0.1,
        }
    }
}

impl AutotuneConfig {
    pub fn validate(&self) -> ControlResult<()> {
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "autotune step must be positive",
            });
        }
        if self.session_ms == 0 {
            return Err(ControlError::InvalidArg {
                what: "autotune session must be longer than zero",
            });
        }
        if !self.min_amplitude.is_finite() || self.min_amplitude <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "autotune min_amplitude must be positive",
            });
        }
        Ok(())
    }
}

/// Which side of the setpoint the measurement is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Half {
    /// Above the setpoint, relay off.
    Above,
    /// At or below the setpoint, relay at `step`.
    Below,
}

/// Why a session did not produce gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TuneFailure {
    /// Oscillation amplitude below the configured minimum.
    NoOscillation { amplitude: f64 },
    /// The computed gains were not finite.
    NonFiniteGains,
}

/// Result of one relay step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TuneStep {
    /// Session continues; drive the output with this relay value.
    Relay(f64),
    /// Session finished with these gains.
    Complete(TuneReport),
    /// Session finished without usable gains.
    Failed(TuneFailure),
}

/// Summary of a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuneReport {
    pub gains: PidGains,
    pub amplitude: f64,
    pub ultimate_gain: f64,
    pub ultimate_period_s: f64,
    pub cycles: u32,
}

/// Data of an in-progress session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutotuneSession {
    pub config: AutotuneConfig,
    pub started_ms: u64,
    /// Latest completed high peak.
    pub peak_high: f64,
    /// Latest completed low peak.
    pub peak_low: f64,
    /// Number of full oscillation cycles observed.
    pub cycles: u32,
    half: Option<Half>,
    extreme: f64,
}

impl AutotuneSession {
    /// Start a session around `setpoint` at time `now_ms`.
    pub fn start(config: AutotuneConfig, setpoint: f64, now_ms: u64) -> ControlResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            started_ms: now_ms,
            peak_high: setpoint,
            peak_low: setpoint,
            cycles: 0,
            half: None,
            extreme: setpoint,
        })
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_ms)
    }

    /// Side of the setpoint the relay is currently tracking.
    pub fn half(&self) -> Option<Half> {
        self.half
    }

    /// Advance the session by one sample.
    ///
    /// A missing measurement holds the relay off and leaves the peaks alone;
    /// the session clock keeps running so the session still ends on time.
    pub fn step(&mut self, input: Option<f64>, setpoint: f64, now_ms: u64) -> TuneStep {
        if self.elapsed_ms(now_ms) >= self.config.session_ms {
            return self.finish();
        }

        let Some(value) = input.filter(|v| v.is_finite()) else {
            return TuneStep::Relay(0.0);
        };

        let half = if value > setpoint {
            Half::Above
        } else {
            Half::Below
        };

        match self.half {
            Some(current) if current != half => {
                match current {
                    Half::Above => self.peak_high = self.extreme,
                    Half::Below => {
                        self.peak_low = self.extreme;
                        self.cycles += 1;
                    }
                }
                self.half = Some(half);
                self.extreme = value;
            }
            Some(Half::Above) => self.extreme = self.extreme.max(value),
            Some(Half::Below) => self.extreme = self.extreme.min(value),
            None => {
                self.half = Some(half);
                self.extreme = value;
            }
        }

        match half {
            Half::Above => TuneStep::Relay(0.0),
            Half::Below => TuneStep::Relay(self.config.step),
        }
    }

    fn finish(&self) -> TuneStep {
        let amplitude = (self.peak_high - self.peak_low) / 2.0;
        let period_s = self.config.session_ms as f64 / 1000.0;
        match relay_gains(self.config.step, amplitude, period_s, self.config.min_amplitude) {
            Ok((gains, ku)) => TuneStep::Complete(TuneReport {
                gains,
                amplitude,
                ultimate_gain: ku,
                ultimate_period_s: period_s,
                cycles: self.cycles,
            }),
            Err(failure) => TuneStep::Failed(failure),
        }
    }
}

/// Derive PID gains from relay step, oscillation amplitude and ultimate period.
///
/// Returns the gains and the ultimate gain `Ku`.
pub fn relay_gains(
    step: f64,
    amplitude: f64,
    period_s: f64,
    min_amplitude: f64,
) -> Result<(PidGains, f64), TuneFailure> {
    if !(amplitude >= min_amplitude) {
        return Err(TuneFailure::NoOscillation { amplitude });
    }
    let ku = 4.0 * step / (std::f64::consts::PI * amplitude);
    let gains = PidGains {
        kp: 0.6 * ku,
        ki: 1.2 * ku / period_s,
        kd: 0.075 * ku * period_s,
    };
    if gains.validate().is_err() || !ku.is_finite() {
        return Err(TuneFailure::NonFiniteGains);
    }
    Ok((gains, ku))
}
