//! tr-project: startup configuration file format and validation.
//!
//! The file is read once at startup; nothing is written back while the
//! station runs.

pub mod apply;
pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_station};

pub const LATEST_VERSION: u32 = 1;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Engine error: {0}")]
    Engine(#[from] tr_engine::EngineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<StationDef> {
    let content = std::fs::read_to_string(path)?;
    let station: StationDef = serde_yaml::from_str(&content)?;
    validate_station(&station)?;
    Ok(station)
}

pub fn save_yaml(path: &std::path::Path, station: &StationDef) -> ProjectResult<()> {
    validate_station(station)?;
    let content = serde_yaml::to_string(station)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<StationDef> {
    let content = std::fs::read_to_string(path)?;
    let station: StationDef = serde_json::from_str(&content)?;
    validate_station(&station)?;
    Ok(station)
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &std::path::Path) -> ProjectResult<StationDef> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}
