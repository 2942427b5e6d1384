//! Core error types.

use thiserror::Error;

/// Errors that can occur while configuring or running the tool suite.
#[derive(Debug, Error)]
pub enum TidyError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tool adapter failed in a way it could not report as issues.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Report rendering error.
    #[error("Report error: {0}")]
    Report(String),

    /// Invalid regular expression in a filter or exclusion list.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),
}

impl TidyError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a tool error.
    pub fn tool(message: impl Into<String>) -> Self {
        Self::Tool(message.into())
    }

    /// Creates a report error.
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report(message.into())
    }
}

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, TidyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = TidyError::config("workers must be at least 1");
        assert_eq!(
            err.to_string(),
            "Configuration error: workers must be at least 1"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TidyError = io.into();
        assert!(matches!(err, TidyError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_pattern_error_conversion() {
        let err: TidyError = regex::Regex::new("(unclosed").unwrap_err().into();
        assert!(err.to_string().starts_with("Invalid pattern"));
    }
}
