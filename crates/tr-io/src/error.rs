//! Error types for I/O adapters.

use thiserror::Error;

pub type IoResult<T> = Result<T, IoError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IoError {
    #[error("Invalid sensor settings: {what}")]
    InvalidSettings { what: &'static str },

    #[error(transparent)]
    Core(#[from] tr_core::TrError),
}
