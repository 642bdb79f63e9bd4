//! Error handling for the Home Zenith backend.

/// A specialized `Result` type for Home Zenith operations.
pub type Result<T> = std::result::Result<T, ZenithError>;

/// The main error type for Home Zenith operations.
#[derive(Debug, thiserror::Error)]
pub enum ZenithError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metrics provider read failed or returned malformed data
    #[error("metrics provider error: {0}")]
    Provider(String),

    /// Metrics store operation failed
    #[error("metrics store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// System information parsing failed
    #[error("failed to parse system information: {0}")]
    Parse(String),

    /// Web server error
    #[error("web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl ZenithError {
    /// Create a new provider error
    pub fn provider_error(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
