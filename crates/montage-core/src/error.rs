//! Error types for Montage.

use thiserror::Error;

/// Main error type for core Montage operations.
#[derive(Error, Debug)]
pub enum MontageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for core Montage operations.
pub type Result<T> = std::result::Result<T, MontageError>;
