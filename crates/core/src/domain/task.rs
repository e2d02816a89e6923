// Task Domain Model

use crate::domain::error::{DomainError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

/// Task ID (unique per issuing index)
pub type TaskId = u64;

/// Task Status
///
/// Lifecycle is forward-only: `Enqueued -> Processing -> (Processed | Failed)`.
/// `Processed` and `Failed` are terminal and mutually incomparable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    #[default]
    Enqueued,
    Processing,
    #[serde(alias = "succeeded")]
    Processed,
    Failed,
}

impl TaskStatus {
    /// Processed or Failed
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Processed | TaskStatus::Failed)
    }

    /// Position in the lifecycle. Both terminal states share the last rank.
    pub fn rank(self) -> u8 {
        match self {
            TaskStatus::Enqueued => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Processed | TaskStatus::Failed => 2,
        }
    }

    /// Whether an observation of `self` may be followed by an observation of `next`.
    ///
    /// Observing the same status twice is allowed (the task simply has not moved).
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Enqueued => "enqueued",
            TaskStatus::Processing => "processing",
            TaskStatus::Processed => "processed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl PartialOrd for TaskStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self.rank() == other.rank() {
            None
        } else {
            Some(self.rank().cmp(&other.rank()))
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of asynchronous operation a task represents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskKind {
    #[serde(
        alias = "DocumentsAddition",
        alias = "documentsAddition",
        alias = "documentAdditionOrUpdate"
    )]
    DocumentAddition,
    #[serde(alias = "DocumentsPartial", alias = "documentsPartial")]
    DocumentUpdate,
    #[serde(alias = "DocumentsDeletion", alias = "documentsDeletion")]
    DocumentDeletion,
    #[serde(alias = "ClearAll", alias = "clearAll", alias = "documentsClear")]
    DocumentClear,
    #[serde(alias = "Settings", alias = "settings")]
    SettingsUpdate,
    #[serde(alias = "IndexCreation")]
    IndexCreation,
    #[serde(alias = "IndexUpdate")]
    IndexUpdate,
    #[serde(alias = "IndexDeletion")]
    IndexDeletion,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskKind::DocumentAddition => "documentAddition",
            TaskKind::DocumentUpdate => "documentUpdate",
            TaskKind::DocumentDeletion => "documentDeletion",
            TaskKind::DocumentClear => "documentClear",
            TaskKind::SettingsUpdate => "settingsUpdate",
            TaskKind::IndexCreation => "indexCreation",
            TaskKind::IndexUpdate => "indexUpdate",
            TaskKind::IndexDeletion => "indexDeletion",
            TaskKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Error payload reported by the engine for a failed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl TaskError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
            error_type: None,
            link: None,
        }
    }
}

/// Immutable snapshot of an asynchronous operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TaskRepr")]
pub struct Task {
    pub id: TaskId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_uid: Option<String>,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub status: TaskStatus,

    pub enqueued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Task {
    /// Create a freshly enqueued task
    pub fn enqueued(
        id: TaskId,
        index_uid: impl Into<String>,
        kind: TaskKind,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            index_uid: Some(index_uid.into()),
            kind,
            status: TaskStatus::Enqueued,
            enqueued_at: Some(enqueued_at),
            started_at: None,
            finished_at: None,
            error: None,
            details: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Processed
    }

    pub fn is_failure(&self) -> bool {
        self.status == TaskStatus::Failed
    }

    /// Index uid, or `"?"` when the engine did not report one
    pub fn index_label(&self) -> &str {
        self.index_uid.as_deref().unwrap_or("?")
    }

    /// Message of the error payload, if any
    pub fn failure_message(&self) -> &str {
        self.error
            .as_ref()
            .map(|e| e.message.as_str())
            .unwrap_or("no error payload")
    }

    /// Check that `next` is a legal follow-up observation of this task
    pub fn check_transition(&self, next: &Task) -> Result<()> {
        if !self.status.can_transition_to(next.status) {
            return Err(DomainError::StatusRegression {
                task_id: self.id,
                from: self.status,
                to: next.status,
            });
        }
        Ok(())
    }

    /// Transition to Processing with explicit timestamp
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(TaskStatus::Processing)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// Transition to Processed with explicit timestamp
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(TaskStatus::Processed)?;
        self.finished_at = Some(now);
        Ok(())
    }

    /// Transition to Failed with explicit timestamp and error payload
    pub fn fail(&mut self, now: DateTime<Utc>, error: TaskError) -> Result<()> {
        self.transition(TaskStatus::Failed)?;
        self.finished_at = Some(now);
        self.error = Some(error);
        Ok(())
    }

    fn transition(&mut self, next: TaskStatus) -> Result<()> {
        if self.status == next || !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// (index uid, task id) pair identifying a task to wait for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskRef {
    pub index_uid: String,
    pub task_id: TaskId,
}

impl TaskRef {
    pub fn new(index_uid: impl Into<String>, task_id: TaskId) -> Self {
        Self {
            index_uid: index_uid.into(),
            task_id,
        }
    }
}

/// Wire shape accepted for tasks.
///
/// Older engines answer with `updateId`, a `{name, number}` type object,
/// `processedAt`, and flat `errorMessage`/`errorCode` fields.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRepr {
    #[serde(alias = "updateId", alias = "uid", alias = "taskUid")]
    id: TaskId,
    #[serde(default)]
    index_uid: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "deserialize_kind")]
    kind: TaskKind,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default)]
    enqueued_at: Option<DateTime<Utc>>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "processedAt")]
    finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    error: Option<TaskError>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error_link: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

impl From<TaskRepr> for Task {
    fn from(repr: TaskRepr) -> Self {
        let error = repr.error.or_else(|| {
            repr.error_message.map(|message| TaskError {
                message,
                code: repr.error_code,
                error_type: repr.error_type,
                link: repr.error_link,
            })
        });

        Self {
            id: repr.id,
            index_uid: repr.index_uid,
            kind: repr.kind,
            status: repr.status,
            enqueued_at: repr.enqueued_at,
            started_at: repr.started_at,
            finished_at: repr.finished_at,
            error,
            details: repr.details,
        }
    }
}

fn deserialize_kind<'de, D>(deserializer: D) -> std::result::Result<TaskKind, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum KindRepr {
        Name(TaskKind),
        Legacy { name: TaskKind },
    }

    Ok(match Option::<KindRepr>::deserialize(deserializer)? {
        Some(KindRepr::Name(kind)) | Some(KindRepr::Legacy { name: kind }) => kind,
        None => TaskKind::Unknown,
    })
}
