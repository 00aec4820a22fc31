//! Per-channel alarm state machine.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tr_core::{ChannelId, FaultCode, TrError, TrResult};

use crate::indicator::Indicators;
use crate::level::{AlarmLevel, ResetMode};

/// Alarm thresholds and policy of one channel.
///
/// Band nesting (`warning_low >= alarm_low`, `warning_high <= alarm_high`)
/// is not enforced: alarm bands are checked before warning bands, so an
/// inverted configuration is well defined, if odd.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub warning_low: f64,
    pub warning_high: f64,
    pub alarm_low: f64,
    pub alarm_high: f64,
    pub reset_mode: ResetMode,
    pub enabled: bool,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            warning_low: -999.0,
            warning_high: 999.0,
            alarm_low: -999.0,
            alarm_high: 999.0,
            reset_mode: ResetMode::AutoReset,
            enabled: true,
        }
    }
}

impl AlarmConfig {
    pub fn validate(&self) -> TrResult<()> {
        for v in [
            self.warning_low,
            self.warning_high,
            self.alarm_low,
            self.alarm_high,
        ] {
            if !v.is_finite() {
                return Err(TrError::NonFinite {
                    what: "alarm threshold",
                    value: v,
                });
            }
        }
        if self.warning_low >= self.warning_high {
            return Err(TrError::InvalidArg {
                what: "warning_low must be below warning_high",
            });
        }
        if self.alarm_low >= self.alarm_high {
            return Err(TrError::InvalidArg {
                what: "alarm_low must be below alarm_high",
            });
        }
        Ok(())
    }

    /// Severity implied by `value` alone. Bounds are inclusive.
    pub fn classify(&self, value: f64) -> AlarmLevel {
        if value <= self.alarm_low || value >= self.alarm_high {
            AlarmLevel::Alarm
        } else if value <= self.warning_low || value >= self.warning_high {
            AlarmLevel::Warning
        } else {
            AlarmLevel::None
        }
    }
}

/// Alarm state of one channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlarmState {
    pub level: AlarmLevel,
    /// The condition behind `level` is currently present.
    pub active: bool,
    pub acknowledged: bool,
    pub fault: FaultCode,
    /// Time of the last escalation or technical raise.
    pub timestamp_ms: u64,
}

/// Alarm evaluator for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmEvaluator {
    id: ChannelId,
    config: AlarmConfig,
    state: AlarmState,
}

impl AlarmEvaluator {
    pub fn new(id: ChannelId, config: AlarmConfig) -> TrResult<Self> {
        config.validate()?;
        Ok(Self {
            id,
            config,
            state: AlarmState::default(),
        })
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    pub fn level(&self) -> AlarmLevel {
        self.state.level
    }

    /// Replace the whole configuration. The current state is kept and
    /// re-evaluated on the next sample.
    pub fn set_config(&mut self, config: AlarmConfig) -> TrResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Evaluate process thresholds against a measured value.
    ///
    /// Escalation is immediate. De-escalation happens only under
    /// `AutoReset`; under `ManualAck` a lower reading marks the held level
    /// inactive so that an acknowledge can clear it. Technical alarms are
    /// owned by [`set_technical_alarm`](Self::set_technical_alarm) and
    /// [`clear_technical_alarm`](Self::clear_technical_alarm) and are left
    /// alone here.
    pub fn update_process_alarm(&mut self, value: f64, now_ms: u64) {
        if !self.config.enabled || !value.is_finite() {
            return;
        }
        if self.state.level == AlarmLevel::Technical {
            return;
        }

        let candidate = self.config.classify(value);
        let current = self.state.level;

        if candidate > current {
            info!(channel = %self.id, from = ?current, to = ?candidate, value, "process alarm raised");
            self.state.level = candidate;
            self.state.fault = FaultCode::None;
            self.state.timestamp_ms = now_ms;
            self.state.active = true;
            self.state.acknowledged = false;
        } else if candidate < current {
            match self.config.reset_mode {
                ResetMode::AutoReset => {
                    info!(channel = %self.id, from = ?current, to = ?candidate, value, "process alarm reset");
                    self.state.level = candidate;
                    self.state.active = candidate != AlarmLevel::None;
                }
                ResetMode::ManualAck => self.state.active = false,
            }
        } else if current != AlarmLevel::None {
            self.state.active = true;
        }
    }

    /// Raise a technical alarm for `fault`.
    ///
    /// Re-raising the same active fault is a no-op, so an acknowledged
    /// persistent fault stays silenced.
    pub fn set_technical_alarm(&mut self, fault: FaultCode, now_ms: u64) {
        let s = &self.state;
        if s.level == AlarmLevel::Technical && s.active && s.fault == fault {
            return;
        }
        warn!(channel = %self.id, %fault, "technical alarm raised");
        self.state = AlarmState {
            level: AlarmLevel::Technical,
            active: true,
            acknowledged: false,
            fault,
            timestamp_ms: now_ms,
        };
    }

    /// The technical fault is gone. Under `AutoReset` the level drops to
    /// `None`; under `ManualAck` it stays `Technical` until acknowledged.
    pub fn clear_technical_alarm(&mut self) {
        if self.state.level != AlarmLevel::Technical {
            return;
        }
        if self.state.active {
            info!(channel = %self.id, fault = %self.state.fault, "technical fault cleared");
        }
        self.state.active = false;
        if self.config.reset_mode == ResetMode::AutoReset {
            self.state.level = AlarmLevel::None;
            self.state.fault = FaultCode::None;
        }
    }

    /// Operator acknowledge. Silences indicators; under `ManualAck` also
    /// clears a level whose condition is no longer present.
    pub fn acknowledge(&mut self) {
        self.state.acknowledged = true;
        if self.config.reset_mode == ResetMode::ManualAck && !self.state.active {
            self.state.level = AlarmLevel::None;
            self.state.fault = FaultCode::None;
        }
    }

    /// `None` and `Warning` let the regulation output through.
    pub fn is_output_enabled(&self) -> bool {
        self.state.level <= AlarmLevel::Warning
    }

    pub fn indicators(&self) -> Indicators {
        Indicators::from_state(&self.state)
    }
}
