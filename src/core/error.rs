//! Error types for core module
//!
//! Covers loading and validating configuration.

use thiserror::Error;

/// Errors that can occur in the core module
#[derive(Error, Debug)]
pub enum CoreError {
    /// Config file I/O error
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file serialization/deserialization error
    #[error("Config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An override carried a value that could not be parsed
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
