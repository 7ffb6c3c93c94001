use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Locally detected problem with a row's fields. Never reaches the gateway.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The clinic settings service could not be reached or answered badly.
    #[error("Sync error: {0}")]
    Sync(#[from] eyre::Report),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Edit conflict: {0}")]
    EditConflict(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,
}

impl ScheduleError {
    /// Whether retrying the same operation could succeed without changing input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScheduleError::Sync(_) | ScheduleError::Timeout(_) | ScheduleError::Cancelled
        )
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
