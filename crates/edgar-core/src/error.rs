use thiserror::Error;

/// Top-level error type for the Edgar responder.
///
/// Subsystem crates define their own error types and implement
/// `From<EdgarError>` so that the `?` operator works across crate boundaries.
/// Most of these are recovered at the load boundary (empty defaults plus a
/// warning) and never reach the per-turn API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EdgarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Routing config error: {0}")]
    Routing(String),

    #[error("Confidence requirement must be between 0.0 and 1.0, got {0}")]
    InvalidConfidence(f32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for EdgarError {
    fn from(err: toml::de::Error) -> Self {
        EdgarError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for EdgarError {
    fn from(err: toml::ser::Error) -> Self {
        EdgarError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for EdgarError {
    fn from(err: serde_json::Error) -> Self {
        EdgarError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Edgar operations.
pub type Result<T> = std::result::Result<T, EdgarError>;
