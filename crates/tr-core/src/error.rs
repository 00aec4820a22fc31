use thiserror::Error;

pub type TrResult<T> = Result<T, TrError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Value out of range for {what}: {value} not in [{min}, {max}]")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}
