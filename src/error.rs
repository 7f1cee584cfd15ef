use std::time::Duration;
use thiserror::Error;

/// Failures a caller of the pool can observe.
///
/// Validation failures and bad releases never show up here: the pool logs
/// them and recovers on its own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("Resource creation failed: {0}")]
    Creation(String),

    #[error("Timed out after {0:?} waiting for a pooled resource")]
    AcquisitionTimeout(Duration),

    #[error("Pool is drained")]
    Drained,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Task failed: {0}")]
    Task(String),
}

impl PoolError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PoolError::Creation(_) | PoolError::AcquisitionTimeout(_)
        )
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PoolError::AcquisitionTimeout(_) => ErrorSeverity::Low,
            PoolError::Task(_) => ErrorSeverity::Low,
            PoolError::Configuration(_) => ErrorSeverity::High,
            PoolError::Runtime(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl From<std::io::Error> for PoolError {
    fn from(err: std::io::Error) -> Self {
        PoolError::Task(err.to_string())
    }
}

impl From<serde_json::Error> for PoolError {
    fn from(err: serde_json::Error) -> Self {
        PoolError::Configuration(err.to_string())
    }
}
