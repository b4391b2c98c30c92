//! Error types for the fieldsort pipeline.
//!
//! Errors are organized by stage so every message names the offending file
//! (and, for relocation, both ends of the file operation).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for fieldsort operations.
#[derive(Error, Debug)]
pub enum FieldsortError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// The image carries no original capture time
    #[error("No capture timestamp (DateTimeOriginal) in {0}")]
    MissingTimestamp(PathBuf),

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A worker task died before producing a result
    #[error("Worker failed for {path}: {message}")]
    Worker { path: PathBuf, message: String },

    /// Two sources render to the same destination
    #[error("Both {first} and {second} would be relocated to {to}")]
    DestinationConflict {
        first: PathBuf,
        second: PathBuf,
        to: PathBuf,
    },

    /// Copying or moving a file failed
    #[error("Failed to relocate {from} -> {to}: {source}")]
    Relocation {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Whether the batch can carry on without this image.
    ///
    /// Everything except a missing capture timestamp is recoverable; what to
    /// do about that one is decided by [`crate::config::TimestampPolicy`].
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::MissingTimestamp(_))
    }
}

/// Convenience type alias for fieldsort results.
pub type Result<T> = std::result::Result<T, FieldsortError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
