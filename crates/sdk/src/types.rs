//! SDK Response Types and response normalisation

use meili_core::domain::{Task, TaskKind};
use meili_core::port::TransportResponse;
use meili_core::Result;
use serde::{Deserialize, Serialize};

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

impl Health {
    pub fn is_available(&self) -> bool {
        self.status == "available"
    }
}

/// Decode the 202 body of a mutating call.
///
/// Minimal bodies (`{"updateId": 0}`) omit the index and operation kind;
/// both are filled from the call site.
pub(crate) fn enqueued_task(
    response: TransportResponse,
    index_uid: &str,
    kind: TaskKind,
) -> Result<Task> {
    let mut task: Task = response.decode()?;
    if task.index_uid.is_none() {
        task.index_uid = Some(index_uid.to_string());
    }
    if task.kind == TaskKind::Unknown {
        task.kind = kind;
    }
    tracing::debug!(
        index_uid = %index_uid,
        task_id = %task.id,
        kind = %task.kind,
        status = %task.status,
        "Task enqueued"
    );
    Ok(task)
}
