//! Two-tier alarm evaluation for thermoreg channels.
//!
//! Each channel owns one [`AlarmEvaluator`]:
//! - **Process alarms** come from the measured value crossing the warning or
//!   alarm band.
//! - **Technical alarms** come from infrastructure faults (sensor failure,
//!   missing sensor assignment) and always take the highest severity.
//!
//! Severity is totally ordered `None < Warning < Alarm < Technical`; anything
//! above `Warning` closes the channel's output gate.

pub mod evaluator;
pub mod indicator;
pub mod level;

pub use evaluator::{AlarmConfig, AlarmEvaluator, AlarmState};
pub use indicator::Indicators;
pub use level::{AlarmLevel, ResetMode};
