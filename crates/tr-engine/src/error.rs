//! Error types for engine operations.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned by engine construction and operator actions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid channel index: {index}")]
    InvalidChannel { index: i64 },

    #[error("Invalid sensor index: {index}")]
    InvalidSensor { index: i64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Control(#[from] tr_controls::ControlError),

    #[error(transparent)]
    Core(#[from] tr_core::TrError),

    #[error(transparent)]
    Io(#[from] tr_io::IoError),
}
