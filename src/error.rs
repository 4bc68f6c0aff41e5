//! Error handling

use thiserror::Error;

pub type ProvResult<T> = Result<T, ProvError>;

#[derive(Debug, Error)]
pub enum ProvError {
    // Record errors
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Edge record at line {line} has no relation_id")]
    MissingRelationId { line: usize },

    #[error("Edge record at line {line} has non-numeric relation_id: {value}")]
    InvalidRelationId { line: usize, value: String },

    // Snapshot errors
    #[error("Invalid snapshot name: {0}")]
    InvalidSnapshotName(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO / serialization
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProvError {
    /// Per-record errors are recoverable: skip the record and keep going
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            ProvError::MalformedRecord { .. }
                | ProvError::MissingRelationId { .. }
                | ProvError::InvalidRelationId { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_errors_are_recoverable() {
        assert!(ProvError::MissingRelationId { line: 3 }.is_record_error());
        assert!(ProvError::MalformedRecord { line: 1, reason: "x".into() }.is_record_error());
        assert!(!ProvError::Config("bad policy".into()).is_record_error());
    }

    #[test]
    fn test_error_messages() {
        let err = ProvError::InvalidRelationId { line: 7, value: "abc".into() };
        assert_eq!(err.to_string(), "Edge record at line 7 has non-numeric relation_id: abc");
    }
}
