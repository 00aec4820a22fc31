use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error(transparent)]
    Project(#[from] tr_project::ProjectError),

    #[error(transparent)]
    Engine(#[from] tr_engine::EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
