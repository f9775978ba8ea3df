//! Error types for Recall

use thiserror::Error;

/// Main error type for Recall operations
#[derive(Error, Debug)]
pub enum RecallError {
    /// A caller broke an operation's contract (e.g. similarity search on a
    /// table with fewer than two records)
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// A typed value store received a value of the wrong kind
    #[error("Type mismatch in store '{store}': expected {expected}, found {found}")]
    TypeMismatch {
        store: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Append log errors (corrupt replay, unreadable run directory, etc.)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Embedding generation errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text-generation collaborator errors that escaped local recovery
    #[error("Summarizer error: {0}")]
    Summarizer(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RecallError {
    fn from(e: serde_json::Error) -> Self {
        RecallError::Serialization(e.to_string())
    }
}

/// Result type alias for Recall operations
pub type Result<T> = std::result::Result<T, RecallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_display() {
        let err = RecallError::TypeMismatch {
            store: "action_scores".to_string(),
            expected: "float",
            found: "string",
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch in store 'action_scores': expected float, found string"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: RecallError = io.into();
        assert!(matches!(err, RecallError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: disk full");
    }
}
