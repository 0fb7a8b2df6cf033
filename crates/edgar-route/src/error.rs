//! Error types for the router and its handlers.

use edgar_core::error::EdgarError;

/// Errors from handler lookup and execution.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Handler not registered: {0}")]
    UnregisteredHandler(String),
    #[error("Handler failed: {0}")]
    HandlerFailed(String),
    #[error("Invalid handler input: {0}")]
    InvalidInput(String),
    #[error("Routing config error: {0}")]
    Config(#[from] EdgarError),
}
