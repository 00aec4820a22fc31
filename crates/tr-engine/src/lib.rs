//! Regulation engine for thermoreg.
//!
//! The engine binds one [`RegulationChannel`](tr_controls::RegulationChannel)
//! and one [`AlarmEvaluator`](tr_alarms::AlarmEvaluator) per channel into a
//! single periodic tick:
//!
//! ```text
//! SensorPort ──▶ alarm (health, then value) ──▶ gate (alarm && enable)
//!                                                   │
//!                    indicators ◀── OutputSink ◀── channel.update
//! ```
//!
//! Configuration changes arrive as per-field patches between ticks; operator
//! actions (acknowledge, auto-tune, forced state, enable toggle, sensor
//! simulation) are plain method calls on [`RegulationEngine`].

pub mod engine;
pub mod error;
pub mod patch;
pub mod snapshot;

pub use engine::{ChannelSetup, ChannelSlot, EngineConfig, RegulationEngine, TickReport};
pub use error::{EngineError, EngineResult};
pub use patch::{
    AlarmPatch, ControllerPatch, GAIN_RANGE, HYSTERESIS_RANGE, OUTPUT_LIMIT_RANGE, PatchOutcome,
    TEMPERATURE_RANGE,
};
pub use snapshot::{ChannelSnapshot, EngineSnapshot, SensorReading};
