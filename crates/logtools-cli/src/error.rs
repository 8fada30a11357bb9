//! CLI error types.

use std::fmt;

use logtools::LogError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// The logger rejected a request.
    Log(LogError),
    /// Invalid configuration.
    Config(String),
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log(e) => write!(f, "logger error: {e}"),
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Log(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<LogError> for CliError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::InvalidConfig(msg) => Self::InvalidArgument(msg),
            other => Self::Log(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_config() {
        let err = CliError::Config("settings unreadable".into());
        assert_eq!(err.to_string(), "configuration error: settings unreadable");
    }

    #[test]
    fn cli_error_from_invalid_config() {
        let err = CliError::from(LogError::InvalidConfig("ratio must be in (0, 1)".into()));
        assert_eq!(err.to_string(), "invalid argument: ratio must be in (0, 1)");
    }

    #[test]
    fn cli_error_from_writer_closed() {
        let err = CliError::from(LogError::WriterClosed);
        assert!(matches!(err, CliError::Log(LogError::WriterClosed)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
