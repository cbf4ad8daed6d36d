use thiserror::Error;

/// Unified error type for goops operations
#[derive(Error, Debug)]
pub enum GoopsError {
    #[error("Invalid semantic version: {0}")]
    Parse(String),

    #[error("Pattern not found: {0}")]
    PatternNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Repository fact unavailable: {0}")]
    FactUnavailable(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in goops
pub type Result<T> = std::result::Result<T, GoopsError>;

impl GoopsError {
    /// Create a version parsing error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        GoopsError::Parse(msg.into())
    }

    /// Create a missing-pattern error with context
    pub fn pattern_not_found(msg: impl Into<String>) -> Self {
        GoopsError::PatternNotFound(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        GoopsError::Config(msg.into())
    }

    /// Create an unavailable-fact error with context
    pub fn fact_unavailable(msg: impl Into<String>) -> Self {
        GoopsError::FactUnavailable(msg.into())
    }

    /// Create an HTTP error with context
    pub fn http(msg: impl Into<String>) -> Self {
        GoopsError::Http(msg.into())
    }

    /// Create an external command error with context
    pub fn command(msg: impl Into<String>) -> Self {
        GoopsError::Command(msg.into())
    }
}

impl From<reqwest::Error> for GoopsError {
    fn from(err: reqwest::Error) -> Self {
        GoopsError::Http(err.to_string())
    }
}
