//! Error types for the logging engine.

use thiserror::Error;

/// Errors that can surface from the logging engine.
///
/// Append and sweep failures never show up here: they are logged and the
/// affected entry or file is skipped.
#[derive(Debug, Error)]
pub enum LogError {
    /// The global instance was used before [`crate::init_global`].
    #[error("logtools is not initialized, call initialize() first")]
    NotInitialized,

    /// The writer thread has shut down and no longer accepts entries.
    #[error("log writer is closed")]
    WriterClosed,

    /// A configuration value was rejected.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for logging operations.
pub type Result<T> = std::result::Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = LogError::NotInitialized;
        assert_eq!(
            err.to_string(),
            "logtools is not initialized, call initialize() first"
        );

        let err = LogError::WriterClosed;
        assert_eq!(err.to_string(), "log writer is closed");

        let err = LogError::InvalidConfig("ratio must be in (0, 1)".to_string());
        assert_eq!(err.to_string(), "invalid config: ratio must be in (0, 1)");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LogError>();
    }

    #[test]
    fn error_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LogError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert!(matches!(err, LogError::Io(_)));
    }

    #[test]
    fn error_serialization_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").err();
        assert!(json_err.is_some());
        if let Some(json_err) = json_err {
            let err: LogError = json_err.into();
            assert!(err.to_string().starts_with("serialization error"));
        }
    }
}
