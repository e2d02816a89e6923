//! Index Handle
//!
//! A non-owning handle on one remote index. Mutating calls return the
//! enqueued [`Task`] right away; pair them with [`Index::wait_for_task`] to
//! block until the engine has applied them.

use crate::types::enqueued_task;
use chrono::{DateTime, Utc};
use meili_core::application::{PollOptions, TaskPoller, TaskService};
use meili_core::domain::document::validate_document_id;
use meili_core::domain::{
    check_primary_key, validate_index_uid, DocumentsQuery, IndexDescriptor, IndexStats, Listing,
    SearchQuery, SearchResults, Settings, Task, TaskId, TaskKind,
};
use meili_core::endpoints;
use meili_core::port::{Transport, TransportRequest};
use meili_core::{MeiliError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct Index {
    pub uid: String,
    pub primary_key: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    transport: Arc<dyn Transport>,
    tasks: TaskService,
    poller: TaskPoller,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("uid", &self.uid)
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}

impl Index {
    pub(crate) fn new(uid: impl Into<String>, transport: Arc<dyn Transport>, poller: TaskPoller) -> Self {
        Self {
            uid: uid.into(),
            primary_key: None,
            created_at: None,
            updated_at: None,
            tasks: TaskService::new(transport.clone()),
            transport,
            poller,
        }
    }

    pub(crate) fn from_descriptor(
        descriptor: IndexDescriptor,
        transport: Arc<dyn Transport>,
        poller: TaskPoller,
    ) -> Self {
        let mut index = Self::new(descriptor.uid.clone(), transport, poller);
        index.apply(descriptor);
        index
    }

    fn apply(&mut self, descriptor: IndexDescriptor) {
        self.primary_key = descriptor.primary_key;
        self.created_at = descriptor.created_at;
        self.updated_at = descriptor.updated_at;
    }

    async fn send(&self, request: TransportRequest) -> Result<meili_core::port::TransportResponse> {
        validate_index_uid(&self.uid)?;
        Ok(self.transport.send(request).await?)
    }

    async fn mutate(&self, request: TransportRequest, kind: TaskKind) -> Result<Task> {
        let response = self.send(request).await?;
        enqueued_task(response, &self.uid, kind)
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Add documents, replacing any existing document with the same id.
    ///
    /// With an explicit `primary_key`, every document must carry that field;
    /// the batch is rejected before any request is sent otherwise.
    pub async fn add_documents<T: Serialize>(
        &self,
        documents: &[T],
        primary_key: Option<&str>,
    ) -> Result<Task> {
        let request = self.documents_request(documents, primary_key, |path, body| {
            TransportRequest::post(path, body)
        })?;
        self.mutate(request, TaskKind::DocumentAddition).await
    }

    /// Add documents, merging fields into existing documents with the same id
    pub async fn update_documents<T: Serialize>(
        &self,
        documents: &[T],
        primary_key: Option<&str>,
    ) -> Result<Task> {
        let request = self.documents_request(documents, primary_key, |path, body| {
            TransportRequest::put(path, body)
        })?;
        self.mutate(request, TaskKind::DocumentUpdate).await
    }

    fn documents_request<T: Serialize>(
        &self,
        documents: &[T],
        primary_key: Option<&str>,
        build: impl FnOnce(String, Value) -> TransportRequest,
    ) -> Result<TransportRequest> {
        validate_index_uid(&self.uid)?;
        let values = documents
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()?;
        if let Some(pk) = primary_key {
            check_primary_key(&values, pk)?;
        }

        let mut request = build(endpoints::documents(&self.uid), Value::Array(values));
        if let Some(pk) = primary_key {
            request = request.with_query("primaryKey", pk);
        }
        Ok(request)
    }

    pub async fn get_document<T: DeserializeOwned>(&self, document_id: &str) -> Result<T> {
        validate_document_id(document_id)?;
        let response = self
            .send(TransportRequest::get(endpoints::document(&self.uid, document_id)))
            .await?;
        Ok(response.decode()?)
    }

    pub async fn get_documents<T: DeserializeOwned>(&self, query: DocumentsQuery) -> Result<Vec<T>> {
        let mut request = TransportRequest::get(endpoints::documents(&self.uid));
        if let Some(offset) = query.offset {
            request = request.with_query("offset", offset);
        }
        if let Some(limit) = query.limit {
            request = request.with_query("limit", limit);
        }
        let listing: Listing<T> = self.send(request).await?.decode()?;
        Ok(listing.into_vec())
    }

    pub async fn delete_document(&self, document_id: &str) -> Result<Task> {
        validate_document_id(document_id)?;
        self.mutate(
            TransportRequest::delete(endpoints::document(&self.uid, document_id)),
            TaskKind::DocumentDeletion,
        )
        .await
    }

    pub async fn delete_documents<S: AsRef<str>>(&self, document_ids: &[S]) -> Result<Task> {
        if document_ids.is_empty() {
            return Err(MeiliError::InvalidArgument(
                "at least one document id is required".to_string(),
            ));
        }
        let mut ids = Vec::with_capacity(document_ids.len());
        for id in document_ids {
            validate_document_id(id.as_ref())?;
            ids.push(Value::String(id.as_ref().to_string()));
        }
        self.mutate(
            TransportRequest::post(endpoints::delete_batch(&self.uid), Value::Array(ids)),
            TaskKind::DocumentDeletion,
        )
        .await
    }

    pub async fn delete_all_documents(&self) -> Result<Task> {
        self.mutate(
            TransportRequest::delete(endpoints::documents(&self.uid)),
            TaskKind::DocumentClear,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub async fn search<T: DeserializeOwned>(&self, query: &SearchQuery) -> Result<SearchResults<T>> {
        let body = serde_json::to_value(query)?;
        let response = self
            .send(TransportRequest::post(endpoints::search(&self.uid), body))
            .await?;
        let results: SearchResults<T> = response.decode()?;
        debug!(
            index_uid = %self.uid,
            hits = results.hits.len(),
            processing_time_ms = results.processing_time_ms,
            "Search completed"
        );
        Ok(results)
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub async fn get_settings(&self) -> Result<Settings> {
        let response = self
            .send(TransportRequest::get(endpoints::settings(&self.uid)))
            .await?;
        Ok(response.decode()?)
    }

    /// Partial update: only the fields set in `settings` change.
    /// Every call enqueues a new task, even when nothing differs.
    pub async fn update_settings(&self, settings: &Settings) -> Result<Task> {
        let body = serde_json::to_value(settings)?;
        self.mutate(
            TransportRequest::patch(endpoints::settings(&self.uid), body),
            TaskKind::SettingsUpdate,
        )
        .await
    }

    pub async fn reset_settings(&self) -> Result<Task> {
        self.mutate(
            TransportRequest::delete(endpoints::settings(&self.uid)),
            TaskKind::SettingsUpdate,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Index lifecycle
    // ------------------------------------------------------------------

    pub async fn get_stats(&self) -> Result<IndexStats> {
        let response = self
            .send(TransportRequest::get(endpoints::stats(&self.uid)))
            .await?;
        Ok(response.decode()?)
    }

    /// Refresh primary key and timestamps from the engine
    pub async fn fetch_info(&mut self) -> Result<IndexDescriptor> {
        let response = self
            .send(TransportRequest::get(endpoints::index(&self.uid)))
            .await?;
        let descriptor: IndexDescriptor = response.decode()?;
        self.apply(descriptor.clone());
        Ok(descriptor)
    }

    /// Delete the index. A missing index fails with `NotFound` and no task.
    pub async fn delete(&self) -> Result<Task> {
        self.mutate(
            TransportRequest::delete(endpoints::index(&self.uid)),
            TaskKind::IndexDeletion,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    pub async fn get_task(&self, task_id: TaskId) -> Result<Task> {
        self.tasks.get_task(&self.uid, task_id).await
    }

    pub async fn get_tasks(&self) -> Result<Vec<Task>> {
        self.tasks.get_index_tasks(&self.uid).await
    }

    /// Block until the task is terminal, or `PollTimeout`
    pub async fn wait_for_task(&self, task_id: TaskId, options: Option<PollOptions>) -> Result<Task> {
        self.poller.wait_for(&self.uid, task_id, options).await
    }
}
