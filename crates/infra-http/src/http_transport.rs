// reqwest implementation of Transport

use crate::connection::{build_client, HttpTransportConfig};
use async_trait::async_trait;
use meili_core::port::{
    ApiError, HttpMethod, Transport, TransportError, TransportRequest, TransportResponse,
};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = build_client(&config)?;
        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, request: &TransportRequest) -> Result<Url, TransportError> {
        let relative = request.path.trim_start_matches('/');
        let mut url = self.base_url.join(relative).map_err(|e| {
            TransportError::InvalidRequest(format!("invalid request path `{}`: {}", request.path, e))
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Convert reqwest::Error to TransportError
fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::InvalidResponse(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else if err.is_timeout() {
        TransportError::Network(format!("request timed out: {}", err))
    } else {
        TransportError::Network(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(&request)?;
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, url = %url, error = %e, "Request failed");
            map_reqwest_error(e)
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        debug!(method = %request.method, path = %request.path, status, "Response received");

        if !(200..300).contains(&status) {
            let error = ApiError::from_body(status, &bytes);
            debug!(status, code = ?error.code, message = %error.message, "Engine returned an error");
            return Err(TransportError::from_status(error));
        }

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                TransportError::InvalidResponse(format!("HTTP {} body is not JSON: {}", status, e))
            })?
        };
        Ok(TransportResponse::new(status, body))
    }
}
