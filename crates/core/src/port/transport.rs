// Transport Port
// Abstraction over the HTTP round-trip to the engine

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request issued through a [`Transport`].
///
/// `path` is relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Patch, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Successful (2xx) response. `body` is `Value::Null` when the engine sent none.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Decode the body into a typed value
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, TransportError> {
        serde_json::from_value(self.body).map_err(|e| {
            TransportError::InvalidResponse(format!(
                "unexpected body for HTTP {}: {}",
                self.status, e
            ))
        })
    }
}

/// Error body returned by the engine on non-2xx responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    #[serde(alias = "errorMessage")]
    pub message: String,
    #[serde(default, alias = "errorCode")]
    pub code: Option<String>,
    #[serde(rename = "type", default, alias = "errorType")]
    pub error_type: Option<String>,
    #[serde(default, alias = "errorLink")]
    pub link: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            error_type: None,
            link: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Parse a raw error body. Non-JSON bodies become the message verbatim.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ApiError>(body) {
            Ok(mut parsed) => {
                parsed.status = status;
                parsed
            }
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                let message = if text.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    text
                };
                Self::new(status, message)
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "HTTP {} [{}]: {}", self.status, code, self.message),
            None => write!(f, "HTTP {}: {}", self.status, self.message),
        }
    }
}

/// Transport errors, classified by cause
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection failure or timeout before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// 401 / 403
    #[error("Authentication error: {0}")]
    Auth(ApiError),

    /// 404
    #[error("Not found: {0}")]
    NotFound(ApiError),

    /// Any other 4xx
    #[error("Validation error: {0}")]
    Validation(ApiError),

    /// 5xx
    #[error("Server error: {0}")]
    Server(ApiError),

    /// 2xx whose body could not be decoded, or an unexpected status class
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be built locally (bad base URL, header value, path)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Classify a non-2xx status
    pub fn from_status(error: ApiError) -> Self {
        match error.status {
            401 | 403 => TransportError::Auth(error),
            404 => TransportError::NotFound(error),
            400..=499 => TransportError::Validation(error),
            500..=599 => TransportError::Server(error),
            _ => TransportError::InvalidResponse(error.to_string()),
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            TransportError::Auth(e)
            | TransportError::NotFound(e)
            | TransportError::Validation(e)
            | TransportError::Server(e) => Some(e),
            TransportError::Network(_)
            | TransportError::InvalidResponse(_)
            | TransportError::InvalidRequest(_) => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|e| e.status)
    }

    pub fn code(&self) -> Option<&str> {
        self.api_error().and_then(|e| e.code.as_deref())
    }
}

/// Transport trait
///
/// Implementations:
/// - `HttpTransport` (meili-infra-http): reqwest over the network
/// - `mocks::ScriptedTransport`: canned responses for tests
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request and return the decoded 2xx response
    ///
    /// # Errors
    /// Non-2xx statuses are returned as classified [`TransportError`]s and
    /// never retried here.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    type Scripted = Result<TransportResponse, TransportError>;

    /// Scripted transport.
    ///
    /// Responses are queued per `(method, path)`; the last queued response
    /// for a route is repeated once the queue is down to one entry.
    /// Unscripted routes answer 404.
    #[derive(Default)]
    pub struct ScriptedTransport {
        routes: Mutex<HashMap<(HttpMethod, String), VecDeque<Scripted>>>,
        calls: Mutex<Vec<TransportRequest>>,
        latency: Duration,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Delay every response by `latency` (tokio time)
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        pub fn push(&self, method: HttpMethod, path: impl Into<String>, response: Scripted) {
            self.routes
                .lock()
                .unwrap()
                .entry((method, path.into()))
                .or_default()
                .push_back(response);
        }

        pub fn push_json(&self, method: HttpMethod, path: impl Into<String>, status: u16, body: Value) {
            self.push(method, path, Ok(TransportResponse::new(status, body)));
        }

        pub fn push_error(&self, method: HttpMethod, path: impl Into<String>, error: TransportError) {
            self.push(method, path, Err(error));
        }

        pub fn calls(&self) -> Vec<TransportRequest> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls_to(&self, method: HttpMethod, path: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.method == method && c.path == path)
                .count()
        }

        fn next_response(&self, request: &TransportRequest) -> Scripted {
            let mut routes = self.routes.lock().unwrap();
            let key = (request.method, request.path.clone());
            match routes.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                Some(queue) if queue.len() == 1 => queue[0].clone(),
                _ => Err(TransportError::NotFound(
                    ApiError::new(404, format!("no scripted response for {} {}", key.0, key.1))
                        .with_code("unscripted_route"),
                )),
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
            let response = {
                self.calls.lock().unwrap().push(request.clone());
                self.next_response(&request)
            };
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            response
        }
    }
}
