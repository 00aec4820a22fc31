//! One regulation channel: configuration, runtime state and the controller
//! state machine.
//!
//! ```text
//!            enable / set_state(Running)
//!   Idle  ─────────────────────────────────▶ Running
//!    ▲ ▲ ◀──────────── disable ──────────────  │  ▲
//!    │ │                                       │  │ session complete
//!    │ └──── cancel / tune failure ── Tuning ◀─┘  │ (gains committed)
//!    │                                  └─────────┘
//!    └──── disable ──── Demo, Fail (forced with set_state)
//! ```
//!
//! `Tuning` always carries an [`AutotuneSession`]; no other state does.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tr_core::{ChannelId, SensorId};

use crate::actuator::ActuatorCommand;
use crate::autotune::{AutotuneConfig, AutotuneSession, TuneFailure, TuneReport, TuneStep};
use crate::controller::{ControlLaw, HysteresisController, LawMemory, PidController, PidGains};
use crate::error::{ControlError, ControlResult};
use crate::sampled::SampleConfig;

/// Controller state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControllerState {
    /// Control disabled, output forced to 0.
    #[default]
    Idle,
    /// Control law active.
    Running,
    /// Relay-feedback auto-tune active.
    Tuning,
    /// Fixed 50%-of-max output, for commissioning.
    Demo,
    /// Forced fault, output 0.
    Fail,
}

impl ControllerState {
    pub fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Running => 1,
            Self::Tuning => 2,
            Self::Demo => 3,
            Self::Fail => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::Running),
            2 => Some(Self::Tuning),
            3 => Some(Self::Demo),
            4 => Some(Self::Fail),
            _ => None,
        }
    }
}

/// Controller configuration of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub law: ControlLaw,
    pub gains: PidGains,
    pub setpoint: f64,
    pub output_min: f64,
    pub output_max: f64,
    /// Sensor feeding this channel, `None` if unassigned.
    pub sensor: Option<SensorId>,
    pub enabled: bool,
    pub manual_output: f64,
    /// Dead-band half-width for the hysteresis law.
    pub hysteresis: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            law: ControlLaw::Pid,
            gains: PidGains::default(),
            setpoint: 20.0,
            output_min: 0.0,
            output_max: 255.0,
            sensor: None,
            enabled: false,
            manual_output: 0.0,
            hysteresis: 0.5,
        }
    }
}

impl ChannelConfig {
    /// Check structural invariants. Admissible operator ranges are enforced
    /// upstream, field by field.
    pub fn validate(&self) -> ControlResult<()> {
        self.gains.validate()?;
        if !self.output_min.is_finite() || !self.output_max.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "output limits must be finite",
            });
        }
        if self.output_max <= self.output_min {
            return Err(ControlError::InvalidArg {
                what: "output_max must be greater than output_min",
            });
        }
        if !self.setpoint.is_finite() || !self.manual_output.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "setpoint and manual output must be finite",
            });
        }
        if !self.hysteresis.is_finite() || self.hysteresis < 0.0 {
            return Err(ControlError::InvalidArg {
                what: "hysteresis must be finite and non-negative",
            });
        }
        Ok(())
    }
}

/// How the most recent auto-tune session ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TuneOutcome {
    Completed(TuneReport),
    Failed(TuneFailure),
    Cancelled,
}

/// Runtime state of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRuntime {
    pub state: ControllerState,
    pub last_input: Option<f64>,
    pub last_output: f64,
    /// Gate open and channel enabled on the last tick.
    pub output_active: bool,
    /// Memory of the configured control law.
    pub memory: LawMemory,
    /// Present exactly while `state == Tuning`.
    pub session: Option<AutotuneSession>,
    pub last_tune: Option<TuneOutcome>,
}

/// Per-channel status report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub input: Option<f64>,
    pub output: f64,
    pub setpoint: f64,
    pub enabled: bool,
    pub law: ControlLaw,
    pub state: ControllerState,
    pub output_active: bool,
    pub sensor: Option<SensorId>,
    pub last_tune: Option<TuneOutcome>,
}

/// One regulation loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RegulationChannel {
    id: ChannelId,
    config: ChannelConfig,
    runtime: ChannelRuntime,
    sample: SampleConfig,
}

impl RegulationChannel {
    /// Create a channel. An enabled configuration starts in `Running`.
    pub fn new(id: ChannelId, config: ChannelConfig, sample: SampleConfig) -> ControlResult<Self> {
        config.validate()?;
        let state = if config.enabled {
            ControllerState::Running
        } else {
            ControllerState::Idle
        };
        let runtime = ChannelRuntime {
            state,
            last_input: None,
            last_output: 0.0,
            output_active: false,
            memory: LawMemory::for_law(config.law),
            session: None,
            last_tune: None,
        };
        Ok(Self {
            id,
            config,
            runtime,
            sample,
        })
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn runtime(&self) -> &ChannelRuntime {
        &self.runtime
    }

    pub fn state(&self) -> ControllerState {
        self.runtime.state
    }

    /// Replace the whole configuration.
    ///
    /// Disabling forces `Idle` and cancels a running tune; enabling an `Idle`
    /// channel starts it. Changing the law resets the law memory.
    pub fn set_config(&mut self, config: ChannelConfig) -> ControlResult<()> {
        config.validate()?;
        let was_enabled = self.config.enabled;
        let law_changed = config.law != self.runtime.memory.law();
        self.config = config;

        if law_changed {
            self.runtime.memory = LawMemory::for_law(self.config.law);
        }
        if !self.config.enabled {
            self.enforce_enabled();
        } else if !was_enabled && self.runtime.state == ControllerState::Idle {
            info!(channel = %self.id, "channel enabled, starting control");
            self.enter(ControllerState::Running);
        }
        Ok(())
    }

    /// Forced state override.
    ///
    /// `Tuning` cannot be forced; use [`start_autotune`](Self::start_autotune).
    pub fn set_state(&mut self, state: ControllerState) -> ControlResult<()> {
        if state == ControllerState::Tuning {
            return Err(ControlError::InvalidState {
                what: "tuning must be started with start_autotune".to_string(),
            });
        }
        if state != self.runtime.state {
            info!(channel = %self.id, from = ?self.runtime.state, to = ?state, "forced state change");
            self.enter(state);
        }
        Ok(())
    }

    /// Start a relay-feedback auto-tune session from `Idle` or `Running`.
    pub fn start_autotune(&mut self, config: AutotuneConfig, now_ms: u64) -> ControlResult<()> {
        if !self.config.enabled {
            return Err(ControlError::InvalidState {
                what: format!("channel {} is disabled", self.id),
            });
        }
        match self.runtime.state {
            ControllerState::Idle | ControllerState::Running => {}
            other => {
                return Err(ControlError::InvalidState {
                    what: format!("cannot start autotune from {other:?}"),
                });
            }
        }
        let session = AutotuneSession::start(config, self.config.setpoint, now_ms)?;
        info!(
            channel = %self.id,
            step = config.step,
            session_ms = config.session_ms,
            "autotune started"
        );
        self.runtime.session = Some(session);
        self.runtime.state = ControllerState::Tuning;
        Ok(())
    }

    /// Abort a tune session without applying any result. Returns whether a
    /// session was running.
    pub fn cancel_autotune(&mut self) -> bool {
        if self.runtime.state != ControllerState::Tuning {
            return false;
        }
        info!(channel = %self.id, "autotune cancelled");
        self.enter(ControllerState::Idle);
        true
    }

    /// Run one tick.
    ///
    /// Returns the output in `[output_min, output_max]`, or exactly `0` when
    /// the gate is closed (outside `Tuning`), the channel is `Idle`/`Fail`, or
    /// a closed-loop law has no valid input.
    pub fn update(&mut self, input: Option<f64>, gate_open: bool, now_ms: u64) -> f64 {
        let input = input.filter(|v| v.is_finite());
        self.runtime.last_input = input;
        self.runtime.output_active = gate_open && self.config.enabled;
        self.enforce_enabled();

        if !gate_open && self.runtime.state != ControllerState::Tuning {
            self.runtime.last_output = 0.0;
            return 0.0;
        }

        let raw = match self.runtime.state {
            ControllerState::Tuning => self.tune_step(input, now_ms),
            ControllerState::Running => self.run_law(input),
            ControllerState::Demo => Some(0.5 * self.config.output_max),
            ControllerState::Idle | ControllerState::Fail => None,
        };
        // A session that ended this tick has left Tuning behind a closed gate.
        let raw = raw.filter(|_| gate_open || self.runtime.state == ControllerState::Tuning);

        let output = match raw {
            Some(v) => v.clamp(self.config.output_min, self.config.output_max),
            None => 0.0,
        };
        debug!(channel = %self.id, state = ?self.runtime.state, ?input, output, "channel update");
        self.runtime.last_output = output;
        output
    }

    /// Actuator command for the last computed output.
    pub fn actuator_command(&self) -> ActuatorCommand {
        ActuatorCommand::scale(self.runtime.last_output, self.config.output_max)
    }

    pub fn status(&self) -> ChannelStatus {
        ChannelStatus {
            input: self.runtime.last_input,
            output: self.runtime.last_output,
            setpoint: self.config.setpoint,
            enabled: self.config.enabled,
            law: self.config.law,
            state: self.runtime.state,
            output_active: self.runtime.output_active,
            sensor: self.config.sensor,
            last_tune: self.runtime.last_tune,
        }
    }

    fn enforce_enabled(&mut self) {
        if !self.config.enabled && self.runtime.state != ControllerState::Idle {
            info!(channel = %self.id, from = ?self.runtime.state, "channel disabled, forcing idle");
            self.enter(ControllerState::Idle);
        }
    }

    /// Move to `state`, keeping the session/state invariant.
    fn enter(&mut self, state: ControllerState) {
        if self.runtime.session.take().is_some() {
            self.runtime.last_tune = Some(TuneOutcome::Cancelled);
        }
        if state == ControllerState::Running && self.runtime.state != ControllerState::Running {
            self.runtime.memory = LawMemory::for_law(self.config.law);
        }
        self.runtime.state = state;
    }

    fn run_law(&mut self, input: Option<f64>) -> Option<f64> {
        let cfg = &self.config;
        match (&self.runtime.memory, input) {
            (LawMemory::Manual, _) => Some(cfg.manual_output),
            (LawMemory::Pid(state), Some(pv)) => {
                let pid = PidController {
                    gains: cfg.gains,
                    out_min: cfg.output_min,
                    out_max: cfg.output_max,
                };
                let (next, out) = pid.update(state, pv, cfg.setpoint, self.sample.dt());
                self.runtime.memory = LawMemory::Pid(next);
                Some(out)
            }
            (LawMemory::Hysteresis { on }, Some(pv)) => {
                let hc = HysteresisController {
                    hysteresis: cfg.hysteresis,
                    on_output: cfg.output_max,
                };
                let (on, out) = hc.update(*on, pv, cfg.setpoint);
                self.runtime.memory = LawMemory::Hysteresis { on };
                Some(out)
            }
            (_, None) => None,
        }
    }

    fn tune_step(&mut self, input: Option<f64>, now_ms: u64) -> Option<f64> {
        let setpoint = self.config.setpoint;
        let Some(session) = self.runtime.session.as_mut() else {
            warn!(channel = %self.id, "tuning without a session, forcing idle");
            self.enter(ControllerState::Idle);
            return None;
        };

        match session.step(input, setpoint, now_ms) {
            TuneStep::Relay(v) => Some(v),
            TuneStep::Complete(report) => {
                info!(
                    channel = %self.id,
                    kp = report.gains.kp,
                    ki = report.gains.ki,
                    kd = report.gains.kd,
                    amplitude = report.amplitude,
                    cycles = report.cycles,
                    "autotune complete"
                );
                self.runtime.session = None;
                self.config.gains = report.gains;
                self.runtime.last_tune = Some(TuneOutcome::Completed(report));
                self.enter(ControllerState::Running);
                self.run_law(input)
            }
            TuneStep::Failed(failure) => {
                warn!(channel = %self.id, ?failure, "autotune failed, gains unchanged");
                self.runtime.session = None;
                self.runtime.last_tune = Some(TuneOutcome::Failed(failure));
                self.enter(ControllerState::Idle);
                None
            }
        }
    }
}
