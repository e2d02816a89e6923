// HTTP Client Setup

use meili_core::application::poller::constants::DEFAULT_REQUEST_TIMEOUT;
use meili_core::port::TransportError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// How the API key is presented to the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    #[default]
    Bearer,
    /// `X-Meili-API-Key: <key>` (older engines)
    LegacyApiKey,
}

/// Connection parameters, immutable once the transport is built
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub auth_scheme: AuthScheme,
    pub request_timeout: Duration,
}

impl HttpTransportConfig {
    /// Parse `base_url`; a trailing `/` is added so relative paths join under it
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            TransportError::InvalidRequest(format!("invalid base URL `{}`: {}", base_url, e))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            api_key: None,
            auth_scheme: AuthScheme::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_auth_scheme(mut self, auth_scheme: AuthScheme) -> Self {
        self.auth_scheme = auth_scheme;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Static headers attached to every request
    pub(crate) fn default_headers(&self) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            let (name, value) = match self.auth_scheme {
                AuthScheme::Bearer => (AUTHORIZATION, format!("Bearer {}", key)),
                AuthScheme::LegacyApiKey => {
                    (HeaderName::from_static("x-meili-api-key"), key.clone())
                }
            };
            let mut value = HeaderValue::from_str(&value)
                .map_err(|e| {
                TransportError::InvalidRequest(format!("invalid API key header: {}", e))
            })?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// Build the shared reqwest client
pub(crate) fn build_client(config: &HttpTransportConfig) -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .default_headers(config.default_headers()?)
        .timeout(config.request_timeout)
        .user_agent(concat!("meili-rust-client/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TransportError::InvalidRequest(format!("failed to build HTTP client: {}", e)))
}
