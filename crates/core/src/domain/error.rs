// Domain Error Types

use crate::domain::task::{TaskId, TaskStatus};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid task state transition: {from} -> {to}")]
    InvalidStateTransition { from: TaskStatus, to: TaskStatus },

    #[error("Task {task_id} status regressed: {from} -> {to}")]
    StatusRegression {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Invalid index uid `{0}`: only alphanumeric characters, `-` and `_` are allowed")]
    InvalidIndexUid(String),

    #[error("Invalid document id `{0}`: only alphanumeric characters, `-` and `_` are allowed")]
    InvalidDocumentId(String),

    #[error("Document at position {position} is not a JSON object")]
    NotAnObject { position: usize },

    #[error("Document at position {position} has no usable `{primary_key}` field")]
    MissingPrimaryKey {
        position: usize,
        primary_key: String,
    },
}

pub type Result<T> = std::result::Result<T, DomainError>;
