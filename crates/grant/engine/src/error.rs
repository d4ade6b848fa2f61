//! Handler and configuration errors

use grant_types::EngineError;
use thiserror::Error;

/// Failures surfaced to the host engine
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The tenant's services could not be resolved; the handler cannot run
    #[error("Service access failed: {0}")]
    ServiceAccess(EngineError),

    #[error("Event payload is not a human task: {0}")]
    UnexpectedPayload(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for handler operations
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Configuration load and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
