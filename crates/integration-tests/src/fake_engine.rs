//! In-process fake of the engine's HTTP API
//!
//! Served through a `wiremock::MockServer`. Mutating calls answer `202` with
//! `{"updateId": n}` and queue a task; each `GET /indexes/{uid}/tasks/{id}`
//! moves that task one step (`enqueued -> processing -> processed|failed`),
//! first finishing every earlier task of the same index. While stalled, tasks
//! never get past `processing`.

use chrono::Utc;
use meili_core::domain::{
    document_id, infer_primary_key, IndexDescriptor, SearchQuery, Settings, Task, TaskError,
    TaskId, TaskKind, TaskStatus,
};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const DEFAULT_LIMIT: usize = 20;
const ERROR_LINK: &str = "https://docs.meilisearch.com/errors";

#[derive(Debug, Clone)]
enum Operation {
    CreateIndex { primary_key: Option<String> },
    DeleteIndex,
    AddDocuments {
        documents: Vec<Value>,
        primary_key: Option<String>,
        replace: bool,
    },
    DeleteDocuments(Vec<String>),
    ClearDocuments,
    UpdateSettings(Settings),
    ResetSettings,
}

struct QueuedTask {
    task: Task,
    operation: Operation,
}

struct IndexState {
    descriptor: IndexDescriptor,
    documents: BTreeMap<String, Map<String, Value>>,
    settings: Settings,
}

impl IndexState {
    fn new(uid: &str, primary_key: Option<String>) -> Self {
        let mut descriptor = IndexDescriptor::new(uid, primary_key);
        let now = Utc::now();
        descriptor.created_at = Some(now);
        descriptor.updated_at = Some(now);
        Self {
            descriptor,
            documents: BTreeMap::new(),
            settings: default_settings(),
        }
    }

    fn touch(&mut self) {
        self.descriptor.updated_at = Some(Utc::now());
    }

    fn is_filterable(&self, attribute: &str) -> bool {
        self.settings
            .filterable_attributes
            .as_ref()
            .is_some_and(|attrs| attrs.iter().any(|a| a == attribute))
    }
}

#[derive(Default)]
struct EngineState {
    master_key: Option<String>,
    stalled: bool,
    indexes: BTreeMap<String, IndexState>,
    tasks: BTreeMap<String, Vec<QueuedTask>>,
    task_fetches: HashMap<(String, TaskId), u64>,
}

/// Stateful fake engine; clones share state
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` on every request but `/health`
    pub fn with_master_key(self, key: impl Into<String>) -> Self {
        self.lock().master_key = Some(key.into());
        self
    }

    /// Start a mock server backed by this engine
    pub async fn serve(&self) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(self.clone())
            .mount(&server)
            .await;
        server
    }

    /// Keep every task at `processing` at most
    pub fn stall(&self, stalled: bool) {
        self.lock().stalled = stalled;
    }

    /// Status fetches received for one task, known or not
    pub fn task_fetches(&self, index_uid: &str, task_id: TaskId) -> u64 {
        self.lock()
            .task_fetches
            .get(&(index_uid.to_string(), task_id))
            .copied()
            .unwrap_or(0)
    }

    /// Status fetches received across all tasks
    pub fn total_task_fetches(&self) -> u64 {
        self.lock().task_fetches.values().sum()
    }

    pub fn index_exists(&self, index_uid: &str) -> bool {
        self.lock().indexes.contains_key(index_uid)
    }

    pub fn document_count(&self, index_uid: &str) -> usize {
        self.lock()
            .indexes
            .get(index_uid)
            .map_or(0, |index| index.documents.len())
    }

    /// Tasks of `index_uid`, oldest first
    pub fn tasks_of(&self, index_uid: &str) -> Vec<Task> {
        self.lock()
            .tasks
            .get(index_uid)
            .map(|queue| queue.iter().map(|q| q.task.clone()).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Respond for FakeEngine {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.lock();
        let path = request.url.path().to_string();
        if path != "/health" {
            if let Err(denied) = state.authorize(request) {
                return denied;
            }
        }

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let method = request.method.as_str();
        match (method, segments.as_slice()) {
            ("GET", ["health"]) => ok(json!({ "status": "available" })),
            ("GET", ["indexes"]) => state.list_indexes(),
            ("POST", ["indexes"]) => match parse_body(request) {
                Ok(body) => state.create_index(&body),
                Err(e) => e,
            },
            ("GET", ["indexes", uid]) => state.get_index(uid),
            ("DELETE", ["indexes", uid]) => state.delete_index(uid),
            ("GET", ["indexes", uid, "documents"]) => state.list_documents(uid, request),
            ("POST" | "PUT", ["indexes", uid, "documents"]) => match parse_body(request) {
                Ok(body) => state.add_documents(uid, body, request, method == "POST"),
                Err(e) => e,
            },
            ("DELETE", ["indexes", uid, "documents"]) => {
                state.enqueue_on_existing(uid, TaskKind::DocumentClear, Operation::ClearDocuments)
            }
            ("POST", ["indexes", uid, "documents", "delete-batch"]) => match parse_body(request) {
                Ok(body) => state.delete_documents(uid, body),
                Err(e) => e,
            },
            ("GET", ["indexes", uid, "documents", id]) => state.get_document(uid, id),
            ("DELETE", ["indexes", uid, "documents", id]) => state.enqueue_on_existing(
                uid,
                TaskKind::DocumentDeletion,
                Operation::DeleteDocuments(vec![id.to_string()]),
            ),
            ("GET", ["indexes", uid, "settings"]) => state.get_settings(uid),
            ("POST" | "PUT" | "PATCH", ["indexes", uid, "settings"]) => {
                match parse_body(request).and_then(|body| {
                    serde_json::from_value::<Settings>(body).map_err(|e| {
                        error(400, "bad_request", format!("Invalid settings: {}", e))
                    })
                }) {
                    Ok(patch) => state.enqueue_creating(
                        uid,
                        TaskKind::SettingsUpdate,
                        Operation::UpdateSettings(patch),
                    ),
                    Err(e) => e,
                }
            }
            ("DELETE", ["indexes", uid, "settings"]) => state.enqueue_on_existing(
                uid,
                TaskKind::SettingsUpdate,
                Operation::ResetSettings,
            ),
            ("GET", ["indexes", uid, "stats"]) => state.get_stats(uid),
            ("POST", ["indexes", uid, "search"]) => match parse_body(request).and_then(|body| {
                serde_json::from_value::<SearchQuery>(body)
                    .map_err(|e| error(400, "bad_request", format!("Invalid search: {}", e)))
            }) {
                Ok(query) => state.search(uid, query),
                Err(e) => e,
            },
            ("GET", ["indexes", uid, "tasks"]) => state.list_index_tasks(uid),
            ("GET", ["indexes", uid, "tasks", id]) => match id.parse::<TaskId>() {
                Ok(id) => state.observe_task(uid, id),
                Err(_) => error(400, "bad_request", format!("Invalid task id `{}`", id)),
            },
            ("GET", ["tasks"]) => state.list_all_tasks(),
            _ => error(404, "not_found", format!("No route for {} {}", method, path)),
        }
    }
}

impl EngineState {
    fn authorize(&self, request: &Request) -> Result<(), ResponseTemplate> {
        let Some(master_key) = &self.master_key else {
            return Ok(());
        };
        let header = |name: &str| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let presented = header("authorization")
            .and_then(|v| v.strip_prefix("Bearer ").map(str::to_string))
            .or_else(|| header("x-meili-api-key"));
        match presented {
            None => Err(error(
                401,
                "missing_authorization_header",
                "You must have an authorization token",
            )),
            Some(key) if &key == master_key => Ok(()),
            Some(_) => Err(error(403, "invalid_api_key", "Invalid API key")),
        }
    }

    // ------------------------------------------------------------------
    // Indexes
    // ------------------------------------------------------------------

    fn list_indexes(&self) -> ResponseTemplate {
        let indexes: Vec<&IndexDescriptor> =
            self.indexes.values().map(|index| &index.descriptor).collect();
        ok(json!(indexes))
    }

    fn get_index(&self, uid: &str) -> ResponseTemplate {
        match self.indexes.get(uid) {
            Some(index) => ok(json!(index.descriptor)),
            None => index_not_found(uid),
        }
    }

    fn create_index(&mut self, body: &Value) -> ResponseTemplate {
        let Some(uid) = body.get("uid").and_then(Value::as_str) else {
            return error(400, "missing_index_uid", "`uid` is required");
        };
        let primary_key = body
            .get("primaryKey")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.enqueue(uid, TaskKind::IndexCreation, Operation::CreateIndex { primary_key })
    }

    fn delete_index(&mut self, uid: &str) -> ResponseTemplate {
        self.enqueue_on_existing(uid, TaskKind::IndexDeletion, Operation::DeleteIndex)
    }

    fn get_stats(&self, uid: &str) -> ResponseTemplate {
        let Some(index) = self.indexes.get(uid) else {
            return index_not_found(uid);
        };
        let mut field_distribution: BTreeMap<&str, u64> = BTreeMap::new();
        for document in index.documents.values() {
            for field in document.keys() {
                *field_distribution.entry(field.as_str()).or_default() += 1;
            }
        }
        let is_indexing = self
            .tasks
            .get(uid)
            .is_some_and(|queue| queue.iter().any(|q| !q.task.is_terminal()));
        ok(json!({
            "numberOfDocuments": index.documents.len(),
            "isIndexing": is_indexing,
            "fieldDistribution": field_distribution,
        }))
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    fn add_documents(
        &mut self,
        uid: &str,
        body: Value,
        request: &Request,
        replace: bool,
    ) -> ResponseTemplate {
        let Value::Array(documents) = body else {
            return error(400, "malformed_payload", "Expected a JSON array of documents");
        };
        let primary_key = query_param(request, "primaryKey");
        let kind = if replace {
            TaskKind::DocumentAddition
        } else {
            TaskKind::DocumentUpdate
        };
        self.enqueue_creating(
            uid,
            kind,
            Operation::AddDocuments {
                documents,
                primary_key,
                replace,
            },
        )
    }

    fn delete_documents(&mut self, uid: &str, body: Value) -> ResponseTemplate {
        let ids: Option<Vec<String>> = body.as_array().map(|ids| {
            ids.iter()
                .filter_map(|id| match id {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        });
        match ids {
            Some(ids) => self.enqueue_on_existing(
                uid,
                TaskKind::DocumentDeletion,
                Operation::DeleteDocuments(ids),
            ),
            None => error(400, "malformed_payload", "Expected a JSON array of ids"),
        }
    }

    fn list_documents(&self, uid: &str, request: &Request) -> ResponseTemplate {
        let Some(index) = self.indexes.get(uid) else {
            return index_not_found(uid);
        };
        let offset = query_usize(request, "offset").unwrap_or(0);
        let limit = query_usize(request, "limit").unwrap_or(DEFAULT_LIMIT);
        let documents: Vec<&Map<String, Value>> =
            index.documents.values().skip(offset).take(limit).collect();
        ok(json!(documents))
    }

    fn get_document(&self, uid: &str, id: &str) -> ResponseTemplate {
        let Some(index) = self.indexes.get(uid) else {
            return index_not_found(uid);
        };
        match index.documents.get(id) {
            Some(document) => ok(json!(document)),
            None => error(
                404,
                "document_not_found",
                format!("Document `{}` not found.", id),
            ),
        }
    }

    // ------------------------------------------------------------------
    // Settings & search
    // ------------------------------------------------------------------

    fn get_settings(&self, uid: &str) -> ResponseTemplate {
        match self.indexes.get(uid) {
            Some(index) => ok(json!(index.settings)),
            None => index_not_found(uid),
        }
    }

    fn search(&self, uid: &str, query: SearchQuery) -> ResponseTemplate {
        let Some(index) = self.indexes.get(uid) else {
            return index_not_found(uid);
        };

        let filter = match query.filter.as_deref().map(parse_filter).transpose() {
            Ok(filter) => filter,
            Err(message) => return error(400, "invalid_filter", message),
        };
        if let Some((attribute, _)) = &filter {
            if !index.is_filterable(attribute) {
                return error(
                    400,
                    "invalid_filter",
                    format!("Attribute `{}` is not filterable.", attribute),
                );
            }
        }
        let facets = query.facets.clone().unwrap_or_default();
        if let Some(facet) = facets.iter().find(|f| !index.is_filterable(f)) {
            return error(
                400,
                "invalid_facet",
                format!("Attribute `{}` is not filterable.", facet),
            );
        }

        let words: Vec<String> = query
            .q
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        let matched: Vec<&Map<String, Value>> = index
            .documents
            .values()
            .filter(|doc| matches_words(doc, &words))
            .filter(|doc| {
                filter
                    .as_ref()
                    .map_or(true, |(attr, value)| field_equals(doc, attr, value))
            })
            .collect();

        let mut facet_distribution: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        for facet in &facets {
            let counts = facet_distribution.entry(facet.clone()).or_default();
            for doc in &matched {
                if let Some(value) = doc.get(facet).and_then(scalar_to_string) {
                    *counts.entry(value).or_default() += 1;
                }
            }
        }

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        let hits: Vec<&&Map<String, Value>> = matched.iter().skip(offset).take(limit).collect();
        let mut body = json!({
            "hits": hits,
            "offset": offset,
            "limit": limit,
            "estimatedTotalHits": matched.len(),
            "processingTimeMs": 0,
            "query": query.q.unwrap_or_default(),
        });
        if !facets.is_empty() {
            body["facetDistribution"] = json!(facet_distribution);
        }
        ok(body)
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    fn list_index_tasks(&self, uid: &str) -> ResponseTemplate {
        match self.tasks.get(uid) {
            Some(queue) => ok(json!(queue.iter().map(|q| &q.task).collect::<Vec<_>>())),
            None if self.indexes.contains_key(uid) => ok(json!([])),
            None => index_not_found(uid),
        }
    }

    fn list_all_tasks(&self) -> ResponseTemplate {
        let tasks: Vec<&Task> = self
            .tasks
            .values()
            .flat_map(|queue| queue.iter().map(|q| &q.task))
            .collect();
        ok(json!({ "results": tasks }))
    }

    fn observe_task(&mut self, uid: &str, task_id: TaskId) -> ResponseTemplate {
        *self
            .task_fetches
            .entry((uid.to_string(), task_id))
            .or_default() += 1;
        let exists = self
            .tasks
            .get(uid)
            .is_some_and(|queue| queue.iter().any(|q| q.task.id == task_id));
        if !exists {
            return error(
                404,
                "task_not_found",
                format!("Task {} of index `{}` not found.", task_id, uid),
            );
        }

        if self.stalled {
            self.step(uid, task_id, false);
        } else {
            let earlier: Vec<TaskId> = self.tasks[uid]
                .iter()
                .filter(|q| q.task.id < task_id && !q.task.is_terminal())
                .map(|q| q.task.id)
                .collect();
            for id in earlier {
                self.step(uid, id, true);
                self.step(uid, id, true);
            }
            self.step(uid, task_id, true);
        }

        match self.find_task(uid, task_id) {
            Some(queued) => ok(json!(queued.task)),
            None => error(500, "internal", "task vanished"),
        }
    }

    fn enqueue(&mut self, uid: &str, kind: TaskKind, operation: Operation) -> ResponseTemplate {
        let queue = self.tasks.entry(uid.to_string()).or_default();
        let id = queue.last().map_or(0, |q| q.task.id + 1);
        queue.push(QueuedTask {
            task: Task::enqueued(id, uid, kind, Utc::now()),
            operation,
        });
        ResponseTemplate::new(202).set_body_json(json!({ "updateId": id }))
    }

    /// Enqueue, creating the index first when it does not exist yet
    fn enqueue_creating(&mut self, uid: &str, kind: TaskKind, operation: Operation) -> ResponseTemplate {
        if !self.indexes.contains_key(uid) {
            self.indexes.insert(uid.to_string(), IndexState::new(uid, None));
        }
        self.enqueue(uid, kind, operation)
    }

    /// Enqueue, or `404 index_not_found` without a task
    fn enqueue_on_existing(&mut self, uid: &str, kind: TaskKind, operation: Operation) -> ResponseTemplate {
        if !self.indexes.contains_key(uid) {
            return index_not_found(uid);
        }
        self.enqueue(uid, kind, operation)
    }

    fn find_task(&self, uid: &str, task_id: TaskId) -> Option<&QueuedTask> {
        self.tasks.get(uid)?.iter().find(|q| q.task.id == task_id)
    }

    fn find_task_mut(&mut self, uid: &str, task_id: TaskId) -> Option<&mut QueuedTask> {
        self.tasks.get_mut(uid)?.iter_mut().find(|q| q.task.id == task_id)
    }

    /// Advance one task by a single state
    fn step(&mut self, uid: &str, task_id: TaskId, may_finish: bool) {
        let Some(queued) = self.find_task_mut(uid, task_id) else {
            return;
        };
        let status = queued.task.status;
        match status {
            TaskStatus::Enqueued => {
                queued.task.start(Utc::now()).expect("enqueued task can start");
            }
            TaskStatus::Processing if may_finish => {
                let operation = queued.operation.clone();
                let outcome = self.apply(uid, operation);
                let Some(queued) = self.find_task_mut(uid, task_id) else {
                    return;
                };
                let now = Utc::now();
                match outcome {
                    Ok(()) => queued.task.complete(now).expect("processing task can complete"),
                    Err(e) => queued.task.fail(now, e).expect("processing task can fail"),
                }
            }
            _ => {}
        }
    }

    fn apply(&mut self, uid: &str, operation: Operation) -> Result<(), TaskError> {
        match operation {
            Operation::CreateIndex { primary_key } => {
                if self.indexes.contains_key(uid) {
                    return Err(task_error(
                        format!("Index `{}` already exists.", uid),
                        "index_already_exists",
                    ));
                }
                self.indexes
                    .insert(uid.to_string(), IndexState::new(uid, primary_key));
                Ok(())
            }
            Operation::DeleteIndex => match self.indexes.remove(uid) {
                Some(_) => Ok(()),
                None => Err(index_missing(uid)),
            },
            operation => match self.indexes.get_mut(uid) {
                Some(index) => apply_to_index(index, operation),
                None => Err(index_missing(uid)),
            },
        }
    }
}

fn apply_to_index(index: &mut IndexState, operation: Operation) -> Result<(), TaskError> {
    match operation {
        Operation::AddDocuments {
            documents,
            primary_key,
            replace,
        } => return apply_documents(index, documents, primary_key, replace),
        Operation::DeleteDocuments(ids) => {
            for id in ids {
                index.documents.remove(&id);
            }
        }
        Operation::ClearDocuments => index.documents.clear(),
        Operation::UpdateSettings(patch) => {
            if let Some(attrs) = &patch.filterable_attributes {
                if let Some(bad) = attrs.iter().find(|a| !is_valid_attribute(a)) {
                    return Err(task_error(
                        format!("Attribute `{}` is not a valid filterable attribute name.", bad),
                        "invalid_filterable_attribute",
                    ));
                }
            }
            index.settings.merge(patch);
        }
        Operation::ResetSettings => index.settings = default_settings(),
        Operation::CreateIndex { .. } | Operation::DeleteIndex => {}
    }
    index.touch();
    Ok(())
}

fn index_missing(uid: &str) -> TaskError {
    task_error(format!("Index `{}` not found.", uid), "index_not_found")
}

fn apply_documents(
    index: &mut IndexState,
    documents: Vec<Value>,
    primary_key: Option<String>,
    replace: bool,
) -> Result<(), TaskError> {
    let mut objects = Vec::with_capacity(documents.len());
    for value in documents {
        match value {
            Value::Object(map) => objects.push(map),
            _ => {
                return Err(task_error(
                    "Documents must be JSON objects",
                    "malformed_payload",
                ))
            }
        }
    }

    let primary_key = match (&index.descriptor.primary_key, primary_key) {
        (Some(existing), Some(requested)) if existing != &requested => {
            return Err(task_error(
                format!("Index already has a primary key: `{}`.", existing),
                "index_primary_key_already_exists",
            ))
        }
        (Some(existing), _) => existing.clone(),
        (None, Some(requested)) => requested,
        (None, None) => match objects.first().and_then(infer_primary_key) {
            Some(inferred) => inferred.to_string(),
            None => {
                return Err(task_error(
                    "Could not infer a primary key.",
                    "index_primary_key_no_candidate_found",
                ))
            }
        },
    };

    let mut keyed = Vec::with_capacity(objects.len());
    for object in objects {
        let Some(id) = document_id(&object, &primary_key) else {
            return Err(task_error(
                format!("Document is missing a valid `{}` field.", primary_key),
                "missing_document_id",
            ));
        };
        keyed.push((id, object));
    }

    index.descriptor.primary_key = Some(primary_key);
    for (id, object) in keyed {
        match index.documents.get_mut(&id) {
            Some(existing) if !replace => existing.extend(object),
            _ => {
                index.documents.insert(id, object);
            }
        }
    }
    index.touch();
    Ok(())
}

fn default_settings() -> Settings {
    Settings {
        filterable_attributes: Some(vec![]),
        sortable_attributes: Some(vec![]),
        searchable_attributes: Some(vec!["*".to_string()]),
        displayed_attributes: Some(vec!["*".to_string()]),
        ranking_rules: Some(
            ["words", "typo", "proximity", "attribute", "sort", "exactness"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        ),
        stop_words: Some(vec![]),
        synonyms: Some(BTreeMap::new()),
        distinct_attribute: None,
    }
}

fn is_valid_attribute(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// `attribute = value`, value optionally quoted
fn parse_filter(filter: &str) -> Result<(String, String), String> {
    let (attribute, value) = filter
        .split_once('=')
        .ok_or_else(|| format!("Unsupported filter `{}`", filter))?;
    let attribute = attribute.trim();
    let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
    if attribute.is_empty() || value.is_empty() {
        return Err(format!("Unsupported filter `{}`", filter));
    }
    Ok((attribute.to_string(), value.to_string()))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn field_equals(document: &Map<String, Value>, attribute: &str, expected: &str) -> bool {
    match document.get(attribute) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_to_string)
            .any(|v| v.eq_ignore_ascii_case(expected)),
        Some(value) => scalar_to_string(value).is_some_and(|v| v.eq_ignore_ascii_case(expected)),
        None => false,
    }
}

fn matches_words(document: &Map<String, Value>, words: &[String]) -> bool {
    if words.is_empty() {
        return true;
    }
    let text: String = document
        .values()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    words.iter().all(|w| text.contains(w.as_str()))
}

fn parse_body(request: &Request) -> Result<Value, ResponseTemplate> {
    serde_json::from_slice(&request.body)
        .map_err(|e| error(400, "malformed_payload", format!("Invalid JSON body: {}", e)))
}

fn query_param(request: &Request, name: &str) -> Option<String> {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn query_usize(request: &Request, name: &str) -> Option<usize> {
    query_param(request, name).and_then(|v| v.parse().ok())
}

fn task_error(message: impl Into<String>, code: &str) -> TaskError {
    let mut error = TaskError::new(message, code);
    error.error_type = Some("invalid_request".to_string());
    error.link = Some(format!("{}#{}", ERROR_LINK, code));
    error
}

fn ok(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

fn error(status: u16, code: &str, message: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "message": message.into(),
        "code": code,
        "type": "invalid_request",
        "link": format!("{}#{}", ERROR_LINK, code),
    }))
}

fn index_not_found(uid: &str) -> ResponseTemplate {
    error(404, "index_not_found", format!("Index `{}` not found.", uid))
}
