//! Error types for dataset generation.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BallisticsError>;

/// Unified error type.
///
/// Only configuration and storage problems surface here. Cache misses are
/// recovered by regeneration and mode-finding failures by a fallback, so
/// neither has a variant.
#[derive(Debug, Error)]
pub enum BallisticsError {
    /// Physically meaningless model constants or dataset settings.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the offending setting.
        message: String,
    },

    /// Persisting an artifact failed.
    #[error("Storage error for '{artifact}': {message}")]
    Storage {
        /// Artifact file stem.
        artifact: String,
        /// What went wrong.
        message: String,
    },

    /// An array could not be encoded or decoded.
    #[error("Array codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// Array shapes do not line up.
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BallisticsError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a storage error for the given artifact.
    #[must_use]
    pub fn storage(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    /// Create a shape error.
    #[must_use]
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BallisticsError::config("drag coefficient must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: drag coefficient must be positive"
        );

        let err = BallisticsError::storage("inverse-ballistics_x", "disk full");
        assert!(err.to_string().contains("inverse-ballistics_x"));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BallisticsError = io.into();
        assert!(matches!(err, BallisticsError::Io(_)));
    }
}
