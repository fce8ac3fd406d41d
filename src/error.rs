// Error types module

use thiserror::Error;

/// Centralized error type for URL and responsive attribute generation
///
/// Every operation in this crate is a pure computation, so errors are always
/// returned synchronously and retrying with the same input cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageKitError {
    /// Malformed or missing required input (empty path, empty breakpoints, etc.)
    #[error("Invalid input '{field}': {message}")]
    InvalidInput { field: String, message: String },

    /// Transformation key outside the known grammar (strict mode only)
    #[error("Unsupported transformation parameter: {key}")]
    UnsupportedTransformation { key: String },

    /// Configuration errors (invalid YAML, missing env vars, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ImageKitError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        ImageKitError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(key: impl Into<String>) -> Self {
        ImageKitError::UnsupportedTransformation { key: key.into() }
    }
}

pub type Result<T> = std::result::Result<T, ImageKitError>;
