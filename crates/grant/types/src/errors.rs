//! Error types for engine collaborator calls

/// Failures reported by the engine services the reconciler calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Read failed: {0}")]
    Read(String),

    #[error("Requested window out of bounds: offset {offset}, limit {limit}")]
    OutOfBound { offset: usize, limit: usize },

    #[error("Activity creation failed: {0}")]
    Creation(String),

    #[error("Archiving failed: {0}")]
    Archiving(String),

    #[error("Service access failed: {0}")]
    ServiceAccess(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type alias for engine collaborator calls
pub type EngineResult<T> = Result<T, EngineError>;
