//! Regulation channel primitives for thermoreg.
//!
//! A channel reads one temperature, runs one control law and drives one
//! actuator. This crate owns everything a single channel needs:
//!
//! - **Control laws**: PID, hysteresis (on/off) and manual output
//! - **Auto-tune**: relay-feedback identification that commits PID gains
//! - **State machine**: `Idle`, `Running`, `Tuning`, `Demo`, `Fail`
//! - **Actuator scaling**: output to normalized value and 8-bit duty
//! - **Sampling**: fixed tick period and the clock that schedules it
//!
//! Channels never block and never allocate per tick; orchestration across
//! channels, alarms and I/O lives in `tr-engine`.

pub mod actuator;
pub mod autotune;
pub mod channel;
pub mod controller;
pub mod error;
pub mod sampled;

pub use actuator::ActuatorCommand;
pub use autotune::{AutotuneConfig, AutotuneSession, TuneFailure, TuneReport, TuneStep};
pub use channel::{
    ChannelConfig, ChannelRuntime, ChannelStatus, ControllerState, RegulationChannel, TuneOutcome,
};
pub use controller::{
    ControlLaw, HysteresisController, LawMemory, PidController, PidGains, PidState,
};
pub use error::{ControlError, ControlResult};
pub use sampled::{SampleClock, SampleConfig};
