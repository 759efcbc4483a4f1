use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while turning a config file into a dashboard.
///
/// Every variant is terminal for the load: no partial box list is ever produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown config type '{0}' (expected json, yaml or yml)")]
    UnsupportedFormat(String),

    #[error("Missing config file: {path}: {reason}")]
    FileNotReadable { path: PathBuf, reason: String },

    #[error("Malformed config file {path}: {reason}")]
    MalformedContent { path: PathBuf, reason: String },

    #[error("Missing required field '{0}'")]
    MissingField(String),

    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Invalid box sizes '{0}' (expected \"x, y, width, height\")")]
    InvalidGeometry(String),
}
