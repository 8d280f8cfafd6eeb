//! Error types for the pixmill transformation pipeline.
//!
//! Errors are split along the recovery boundary the runner enforces:
//! configuration errors abort a run, stage errors are confined to the one
//! source file they name.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for pixmill operations.
#[derive(Error, Debug)]
pub enum PixmillError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-file stage errors
    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors. Always fatal to the run.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Per-file pipeline errors, organized by stage.
///
/// Every variant names the source file it belongs to so a failure can be
/// diagnosed from the log line alone.
#[derive(Error, Debug)]
pub enum StageError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Crop geometry was invalid for the source dimensions
    #[error("Crop error for {path}: {message}")]
    Crop { path: PathBuf, message: String },

    /// Encoding to the target format failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Writing the artifact to disk failed
    #[error("Write error for {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// Source path is not under the profile's declared base directory
    #[error("Source {path} is not under base directory {base}")]
    Layout { path: PathBuf, base: PathBuf },
}

impl StageError {
    /// Whether this error indicates a misconfigured run rather than a bad
    /// input file. Fatal errors abort the batch; everything else is
    /// confined to the file it names.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StageError::Layout { .. })
    }
}

/// Convenience type alias for pixmill results.
pub type Result<T> = std::result::Result<T, PixmillError>;

/// Convenience type alias for per-file stage results.
pub type StageResult<T> = std::result::Result<T, StageError>;
