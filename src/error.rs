use thiserror::Error;

/// Main error type for kgraph
#[derive(Error, Debug)]
pub enum KgraphError {
    /// Backing-store errors (SQL execution, constraint violations)
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input from the caller (missing required field); not retried
    #[error("Validation error: {0}")]
    Validation(String),

    /// Text-generation service unreachable or returned non-success
    #[error("Generation service error: {0}")]
    Generation(String),

    /// Generation service responded, but the body was not valid candidate JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenient Result type using KgraphError
pub type Result<T> = std::result::Result<T, KgraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KgraphError::Validation("name is required".to_string());
        assert!(err.to_string().contains("Validation error"));
        assert!(err.to_string().contains("name is required"));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: KgraphError = rusqlite_err.into();
        assert!(matches!(err, KgraphError::Storage(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: KgraphError = io_err.into();
        assert!(matches!(err, KgraphError::Io(_)));
    }

    #[test]
    fn test_generation_and_parse_are_distinct() {
        let unreachable = KgraphError::Generation("connection refused".to_string());
        let garbled = KgraphError::Parse("expected value at line 1".to_string());
        assert!(unreachable.to_string().contains("Generation service error"));
        assert!(garbled.to_string().contains("Parse error"));
    }
}
