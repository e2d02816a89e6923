// Task lookups against the engine

use crate::domain::{validate_index_uid, Listing, Task, TaskId};
use crate::endpoints;
use crate::error::Result;
use crate::port::{Transport, TransportRequest};
use std::sync::Arc;
use tracing::debug;

/// Read-only access to task records
#[derive(Clone)]
pub struct TaskService {
    transport: Arc<dyn Transport>,
}

impl TaskService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch the current snapshot of one task
    pub async fn get_task(&self, index_uid: &str, task_id: TaskId) -> Result<Task> {
        validate_index_uid(index_uid)?;
        let response = self
            .transport
            .send(TransportRequest::get(endpoints::index_task(index_uid, task_id)))
            .await?;
        let mut task: Task = response.decode()?;
        if task.index_uid.is_none() {
            task.index_uid = Some(index_uid.to_string());
        }
        debug!(index_uid = %index_uid, task_id = %task_id, status = %task.status, "Fetched task");
        Ok(task)
    }

    /// All tasks recorded for one index
    pub async fn get_index_tasks(&self, index_uid: &str) -> Result<Vec<Task>> {
        validate_index_uid(index_uid)?;
        let response = self
            .transport
            .send(TransportRequest::get(endpoints::index_tasks(index_uid)))
            .await?;
        let listing: Listing<Task> = response.decode()?;
        Ok(listing
            .into_vec()
            .into_iter()
            .map(|mut task| {
                if task.index_uid.is_none() {
                    task.index_uid = Some(index_uid.to_string());
                }
                task
            })
            .collect())
    }

    /// All tasks across every index
    pub async fn get_all_tasks(&self) -> Result<Vec<Task>> {
        let response = self
            .transport
            .send(TransportRequest::get(endpoints::tasks()))
            .await?;
        let listing: Listing<Task> = response.decode()?;
        Ok(listing.into_vec())
    }
}
