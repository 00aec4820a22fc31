//! Error types for the command protocol.

use thiserror::Error;
use tr_core::FaultCode;
use tr_engine::EngineError;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// A request that could not be carried out.
///
/// The display text is what goes into the `error` field of the response.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Missing command")]
    MissingCommand,

    #[error("Unknown command")]
    UnknownCommand { command: String },

    #[error("Missing {field}")]
    MissingField { field: &'static str },

    #[error("Invalid {field}")]
    InvalidField { field: &'static str },

    #[error("Command too long")]
    CommandTooLong,

    #[error("{0}")]
    Rejected(String),
}

impl ProtocolError {
    /// Fault code reported in `errorCode`.
    pub fn fault(&self) -> FaultCode {
        FaultCode::Communication
    }
}

impl From<EngineError> for ProtocolError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidChannel { .. } => ProtocolError::InvalidField {
                field: "regulator_id",
            },
            EngineError::InvalidSensor { .. } => ProtocolError::InvalidField {
                field: "sensorIndex",
            },
            other => ProtocolError::Rejected(other.to_string()),
        }
    }
}
