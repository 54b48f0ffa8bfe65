//! Engine error taxonomy.
//!
//! Every failure class carries its propagation policy: `DataUnavailable` is
//! the only retriable kind, `InsufficientHistory` is converted into a neutral
//! verdict by the strategies, and validation failures are fatal to the call
//! that produced them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("insufficient history: need {needed} bars, have {have}")]
    InsufficientHistory { needed: usize, have: usize },

    #[error("unknown indicator: {0}")]
    UnknownIndicator(String),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("parameter validation failed: {}", .0.join("; "))]
    ParameterValidation(Vec<String>),

    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("strategy error: {0}")]
    StrategyInternal(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether the scheduler may retry the operation that produced this error.
    pub fn is_retriable(&self) -> bool {
        matches!(self, EngineError::DataUnavailable(_))
    }

    /// Process exit code for the CLI driver: 2 invalid config, 3 data error,
    /// 4 internal error.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::ParameterValidation(_)
            | EngineError::UnknownStrategy(_)
            | EngineError::UnknownIndicator(_)
            | EngineError::NotFound(_) => 2,
            EngineError::DataUnavailable(_)
            | EngineError::InvalidFrame(_)
            | EngineError::InsufficientHistory { .. } => 3,
            _ => 4,
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
