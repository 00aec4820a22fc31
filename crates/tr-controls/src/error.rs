//! Error types for regulation channel operations.

use thiserror::Error;

/// Result type for regulation channel operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in regulation channel operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Operation not allowed in the channel's current controller state.
    #[error("Controller state error: {what}")]
    InvalidState { what: String },

    /// Shared primitive rejected a value.
    #[error(transparent)]
    Core(#[from] tr_core::TrError),
}
