//! Scheduler error types

use std::time::Duration;

use encore_domain::EncoreError;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tokio_cron_scheduler::JobSchedulerError;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    #[error("Failed to create scheduler: {source}")]
    CreationFailed { source: JobSchedulerError },

    #[error("Failed to start scheduler: {source}")]
    StartFailed { source: JobSchedulerError },

    #[error("Failed to stop scheduler: {source}")]
    StopFailed { source: JobSchedulerError },

    /// Usually an invalid cron expression.
    #[error("Failed to register job '{job}': {source}")]
    JobRegistrationFailed { job: &'static str, source: JobSchedulerError },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration, source: Elapsed },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(#[from] JoinError),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let encore_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                EncoreError::InvalidInput(err.to_string())
            }
            SchedulerError::JobRegistrationFailed { .. } => EncoreError::Config(err.to_string()),
            _ => EncoreError::Internal(err.to_string()),
        };
        InfraError(encore_err)
    }
}

impl From<SchedulerError> for EncoreError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
