//! Meili Client Implementation

use crate::config::{config_error, ClientConfig};
use crate::index::Index;
use crate::types::{enqueued_task, Health};
use meili_core::application::{PollOptions, TaskPoller, TaskService};
use meili_core::domain::{
    validate_index_uid, CreateIndexRequest, IndexDescriptor, Listing, Task, TaskId, TaskKind,
    TaskRef,
};
use meili_core::endpoints;
use meili_core::port::{Transport, TransportRequest};
use meili_core::Result;
use meili_infra_http::HttpTransport;
use std::sync::Arc;
use tracing::{debug, info};

/// Meilisearch client
///
/// Holds the connection parameters once and hands out [`Index`] handles that
/// share them. Cloning is cheap.
///
/// # Example
///
/// ```no_run
/// use meili_sdk::{ClientConfig, MeiliClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = MeiliClient::new(&ClientConfig::new("http://localhost:7700").with_api_key("masterKey"))?;
/// let task = client.create_index("movies", Some("id")).await?;
/// client.wait_for_task("movies", task.id, None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MeiliClient {
    transport: Arc<dyn Transport>,
    tasks: TaskService,
    poller: TaskPoller,
}

impl MeiliClient {
    /// Build a client over HTTP; an unusable configuration is a `Config` error
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.transport_config()?).map_err(config_error)?;
        info!(url = %transport.base_url(), "Meili client configured");
        Ok(Self::with_transport(Arc::new(transport), config.poll_options()))
    }

    /// Build a client from `MEILI_*` variables and the default config file
    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env()?)
    }

    /// Build a client over any transport
    pub fn with_transport(transport: Arc<dyn Transport>, poll: PollOptions) -> Self {
        Self {
            tasks: TaskService::new(transport.clone()),
            poller: TaskPoller::with_defaults(transport.clone(), poll),
            transport,
        }
    }

    pub fn poller(&self) -> &TaskPoller {
        &self.poller
    }

    /// Handle on `uid`. No request is made.
    pub fn index(&self, uid: impl Into<String>) -> Index {
        Index::new(uid, self.transport.clone(), self.poller.clone())
    }

    pub async fn health(&self) -> Result<Health> {
        let response = self
            .transport
            .send(TransportRequest::get(endpoints::health()))
            .await?;
        Ok(response.decode()?)
    }

    pub async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>> {
        let response = self
            .transport
            .send(TransportRequest::get(endpoints::indexes()))
            .await?;
        let listing: Listing<IndexDescriptor> = response.decode()?;
        Ok(listing.into_vec())
    }

    /// Fetch an existing index; `NotFound` when it does not exist
    pub async fn get_index(&self, uid: &str) -> Result<Index> {
        validate_index_uid(uid)?;
        let response = self
            .transport
            .send(TransportRequest::get(endpoints::index(uid)))
            .await?;
        let descriptor: IndexDescriptor = response.decode()?;
        Ok(Index::from_descriptor(
            descriptor,
            self.transport.clone(),
            self.poller.clone(),
        ))
    }

    /// Enqueue creation of `uid`
    pub async fn create_index(&self, uid: &str, primary_key: Option<&str>) -> Result<Task> {
        validate_index_uid(uid)?;
        let body = serde_json::to_value(CreateIndexRequest {
            uid: uid.to_string(),
            primary_key: primary_key.map(str::to_string),
        })?;
        let response = self
            .transport
            .send(TransportRequest::post(endpoints::indexes(), body))
            .await?;
        enqueued_task(response, uid, TaskKind::IndexCreation)
    }

    /// Enqueue deletion of `uid`; `NotFound` (and no task) when it does not exist
    pub async fn delete_index(&self, uid: &str) -> Result<Task> {
        self.index(uid).delete().await
    }

    /// Every task known to the engine
    pub async fn get_tasks(&self) -> Result<Vec<Task>> {
        self.tasks.get_all_tasks().await
    }

    pub async fn get_task(&self, index_uid: &str, task_id: TaskId) -> Result<Task> {
        self.tasks.get_task(index_uid, task_id).await
    }

    pub async fn wait_for_task(
        &self,
        index_uid: &str,
        task_id: TaskId,
        options: Option<PollOptions>,
    ) -> Result<Task> {
        self.poller.wait_for(index_uid, task_id, options).await
    }

    /// Wait for several tasks concurrently
    pub async fn wait_for_tasks(
        &self,
        tasks: &[TaskRef],
        options: Option<PollOptions>,
    ) -> Result<Vec<Task>> {
        debug!(count = tasks.len(), "Waiting for tasks");
        self.poller.wait_all(tasks, options).await
    }
}
