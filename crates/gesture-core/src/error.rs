use thiserror::Error;

/// Top-level error type for the gesture daemon.
///
/// Dispatch-level failures are swallowed inside the engine and never reach
/// this type; it covers the process edges (configuration, input parsing, I/O).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GestureError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Shutdown in progress")]
    ShuttingDown,
}

impl From<toml::de::Error> for GestureError {
    fn from(err: toml::de::Error) -> Self {
        GestureError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GestureError {
    fn from(err: toml::ser::Error) -> Self {
        GestureError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for GestureError {
    fn from(err: serde_json::Error) -> Self {
        GestureError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for gesture daemon operations.
pub type Result<T> = std::result::Result<T, GestureError>;
