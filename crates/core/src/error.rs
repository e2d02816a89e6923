// Central Error Type for the Client

use crate::domain::{DomainError, Task};
use crate::port::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Client-level error type
#[derive(Error, Debug)]
pub enum MeiliError {
    /// The request itself failed (network, auth, not found, validation, server)
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The task reached `failed`; only raised when the caller asked for success
    #[error(
        "Task {} on index `{}` failed: {}",
        .task.id,
        .task.index_label(),
        .task.failure_message()
    )]
    TaskFailed { task: Box<Task> },

    /// The deadline elapsed before the task reached a terminal state
    #[error(
        "Timed out after {:?} waiting for task {} on index `{}` (last status: {})",
        .timeout,
        .task.id,
        .task.index_label(),
        .task.status
    )]
    PollTimeout { task: Box<Task>, timeout: Duration },

    #[error("Polling cancelled for task {} (last status: {})", .last_seen.id, .last_seen.status)]
    Cancelled { last_seen: Box<Task> },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MeiliError {
    /// Task snapshot attached to the error, if any
    pub fn task(&self) -> Option<&Task> {
        match self {
            MeiliError::TaskFailed { task } | MeiliError::PollTimeout { task, .. } => Some(task),
            MeiliError::Cancelled { last_seen } => Some(last_seen),
            _ => None,
        }
    }

    /// HTTP status of a classified transport error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            MeiliError::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MeiliError::Transport(TransportError::NotFound(_)))
    }
}

/// Result type alias using MeiliError
pub type Result<T> = std::result::Result<T, MeiliError>;

impl Task {
    /// `Ok(self)` when processed, `TaskFailed` when failed.
    ///
    /// Non-terminal tasks are returned unchanged.
    pub fn into_result(self) -> Result<Task> {
        if self.is_failure() {
            Err(MeiliError::TaskFailed {
                task: Box::new(self),
            })
        } else {
            Ok(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskError, TaskKind};
    use crate::port::ApiError;
    use chrono::Utc;

    #[test]
    fn test_task_failed_message_carries_engine_error() {
        let mut task = Task::enqueued(9, "movies", TaskKind::SettingsUpdate, Utc::now());
        task.start(Utc::now()).unwrap();
        task.fail(
            Utc::now(),
            TaskError::new("`a b` is not a valid attribute", "invalid_attribute"),
        )
        .unwrap();

        let err = task.into_result().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Task 9"));
        assert!(text.contains("movies"));
        assert!(text.contains("not a valid attribute"));
        assert_eq!(err.task().map(|t| t.id), Some(9));
    }

    #[test]
    fn test_transport_error_is_transparent() {
        let err: MeiliError =
            TransportError::from_status(ApiError::new(404, "Index `x` not found.")).into();
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), Some(404));
        assert!(err.to_string().contains("Index `x` not found."));
    }
}
