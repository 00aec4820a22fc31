//! I/O contracts between the regulation engine and the hardware around it.
//!
//! The engine consumes temperatures through [`SensorPort`] and external
//! enable signals through [`EnableInput`], and produces actuator commands and
//! indicator states through [`OutputSink`]. None of these may block: a port
//! answers from state it already holds.
//!
//! Reference implementations are provided for each contract:
//! - [`SensorBank`]: calibrated sensors over a [`SensorDriver`], with a
//!   per-sensor simulation override and stale-data timeout
//! - [`EnableLatch`]: in-memory enable flags toggled by buttons or commands
//! - [`RecordingSink`]: keeps the last emitted command per channel

pub mod enable;
pub mod error;
pub mod output;
pub mod sensor;

pub use enable::{EnableInput, EnableLatch};
pub use error::{IoError, IoResult};
pub use output::{NullSink, OutputSink, RecordingSink};
pub use sensor::{
    Acquisition, NullDriver, SENSOR_TIMEOUT_MS, Sample, SensorBank, SensorDriver, SensorHealth,
    SensorPort, SensorSettings,
};
