//! Custom error types for Materiel
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for Materiel operations
#[derive(Error, Debug)]
pub enum MaterielError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models and form input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// The entity is still referenced by an active loan, rental or repair
    #[error("{entity_type} is in use: {reason}")]
    InUse {
        entity_type: &'static str,
        reason: String,
    },

    /// Wrong password or wrong recovery answer
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The vault is not in a state that allows the requested action
    #[error("Vault state error: expected {expected}, current state is {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    /// Neither the primary keystore nor the fallback store accepted a write
    #[error("Secret storage failed: {0}")]
    SecretStorage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Encryption errors
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl MaterielError {
    /// Create a "not found" error for any entity type
    pub fn not_found(entity_type: &'static str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for articles
    pub fn article_not_found(identifier: impl Into<String>) -> Self {
        Self::not_found("Article", identifier)
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for MaterielError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MaterielError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Materiel operations
pub type MaterielResult<T> = Result<T, MaterielError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MaterielError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = MaterielError::article_not_found("Perceuse");
        assert_eq!(err.to_string(), "Article not found: Perceuse");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_state_error() {
        let err = MaterielError::InvalidState {
            expected: "Unlocked",
            actual: "Locked".into(),
        };
        assert_eq!(
            err.to_string(),
            "Vault state error: expected Unlocked, current state is Locked"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MaterielError = io_err.into();
        assert!(matches!(err, MaterielError::Io(_)));
    }
}
