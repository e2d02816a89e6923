// Table rows and status rendering

use colored::Colorize;
use meili_sdk::{IndexDescriptor, Task, TaskStatus};
use tabled::Tabled;

#[derive(Tabled)]
pub struct IndexRow {
    uid: String,
    #[tabled(rename = "primary key")]
    primary_key: String,
    created: String,
}

impl From<&IndexDescriptor> for IndexRow {
    fn from(index: &IndexDescriptor) -> Self {
        Self {
            uid: index.uid.clone(),
            primary_key: index.primary_key.clone().unwrap_or_else(|| "-".to_string()),
            created: index
                .created_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
pub struct TaskRow {
    id: u64,
    index: String,
    #[tabled(rename = "type")]
    kind: String,
    status: String,
    enqueued: String,
    error: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            index: task.index_label().to_string(),
            kind: task.kind.to_string(),
            status: task.status.to_string(),
            enqueued: task
                .enqueued_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
            error: task
                .error
                .as_ref()
                .map(|e| match &e.code {
                    Some(code) => format!("[{}] {}", code, e.message),
                    None => e.message.clone(),
                })
                .unwrap_or_default(),
        }
    }
}

/// One-line colored summary of a task
pub fn task_line(task: &Task) -> String {
    let status = match task.status {
        TaskStatus::Processed => task.status.to_string().green().bold(),
        TaskStatus::Failed => task.status.to_string().red().bold(),
        TaskStatus::Enqueued | TaskStatus::Processing => task.status.to_string().yellow().bold(),
    };
    format!(
        "task {} ({}) on `{}`: {}",
        task.id,
        task.kind,
        task.index_label(),
        status
    )
}
