//! Client Configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `MEILI_*`
//! environment variables.

use meili_core::application::poller::constants::{
    DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};
use meili_core::application::PollOptions;
use meili_core::port::TransportError;
use meili_core::{MeiliError, Result};
use meili_infra_http::{AuthScheme, HttpTransportConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Engine address used when nothing else is configured
pub const DEFAULT_URL: &str = "http://localhost:7700";

/// Prefix of the environment variables read by [`ClientConfig::load`]
pub const ENV_PREFIX: &str = "MEILI";

/// Connection and polling parameters shared by every handle of a client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub auth_scheme: AuthScheme,
    pub request_timeout_ms: u64,
    pub poll_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            api_key: None,
            auth_scheme: AuthScheme::default(),
            request_timeout_ms: ceil_millis(DEFAULT_REQUEST_TIMEOUT),
            poll_timeout_ms: ceil_millis(DEFAULT_POLL_TIMEOUT),
            poll_interval_ms: ceil_millis(DEFAULT_POLL_INTERVAL),
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_auth_scheme(mut self, auth_scheme: AuthScheme) -> Self {
        self.auth_scheme = auth_scheme;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = ceil_millis(timeout);
        self
    }

    pub fn with_poll_options(mut self, options: PollOptions) -> Self {
        self.poll_timeout_ms = ceil_millis(options.timeout);
        self.poll_interval_ms = ceil_millis(options.interval);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions::new(
            Duration::from_millis(self.poll_timeout_ms),
            Duration::from_millis(self.poll_interval_ms),
        )
    }

    /// Adapter settings derived from this configuration.
    ///
    /// A URL or key the adapter cannot use is a `Config` error.
    pub fn transport_config(&self) -> Result<HttpTransportConfig> {
        let mut transport = HttpTransportConfig::new(&self.url)
            .map_err(config_error)?
            .with_auth_scheme(self.auth_scheme)
            .with_request_timeout(self.request_timeout());
        if let Some(key) = &self.api_key {
            transport = transport.with_api_key(key.clone());
        }
        Ok(transport)
    }

    /// Defaults overlaid with `MEILI_*` variables and the default config file
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load from `path` (or the per-user default location), then `MEILI_*`
    /// environment variables. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.map(Path::to_path_buf).or_else(default_config_path);
        Self::build(
            file.as_deref(),
            config::Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    fn build(file: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(false));
        }
        let loaded: ClientConfig = builder
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| MeiliError::Config(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(MeiliError::Config("url must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(MeiliError::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(MeiliError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whole milliseconds, rounded up so a sub-millisecond duration never becomes zero
fn ceil_millis(duration: Duration) -> u64 {
    let millis = duration.as_millis() + u128::from(duration.subsec_nanos() % 1_000_000 != 0);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

pub(crate) fn config_error(err: TransportError) -> MeiliError {
    match err {
        TransportError::InvalidRequest(message) => MeiliError::Config(message),
        other => MeiliError::Transport(other),
    }
}

/// `<config dir>/meili/config.toml` for the current user
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "meilisearch", "meili")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::build(None, env(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.poll_options(), PollOptions::default());
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::build(
            None,
            env(&[
                ("MEILI_URL", "http://search.internal:7700"),
                ("MEILI_API_KEY", "masterKey"),
                ("MEILI_AUTH_SCHEME", "legacy_api_key"),
                ("MEILI_POLL_TIMEOUT_MS", "2000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.url, "http://search.internal:7700");
        assert_eq!(config.api_key.as_deref(), Some("masterKey"));
        assert_eq!(config.auth_scheme, AuthScheme::LegacyApiKey);
        assert_eq!(config.poll_options().timeout, Duration::from_secs(2));
        assert_eq!(config.poll_options().interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_file_then_env() {
        let path = std::env::temp_dir().join(format!("meili-sdk-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "url = \"http://from-file:7700\"").unwrap();
        writeln!(file, "api_key = \"fileKey\"").unwrap();
        writeln!(file, "poll_interval_ms = 10").unwrap();
        drop(file);

        let config =
            ClientConfig::build(Some(&path), env(&[("MEILI_API_KEY", "envKey")])).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.url, "http://from-file:7700");
        assert_eq!(config.api_key.as_deref(), Some("envKey"));
        assert_eq!(config.poll_interval_ms, 10);
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let path = Path::new("/nonexistent/meili/config.toml");
        let config = ClientConfig::build(Some(path), env(&[])).unwrap();
        assert_eq!(config.url, DEFAULT_URL);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = ClientConfig::build(None, env(&[("MEILI_POLL_INTERVAL_MS", "0")])).unwrap_err();
        assert!(matches!(err, MeiliError::Config(_)));
    }

    #[test]
    fn test_bad_value_is_config_error() {
        let err =
            ClientConfig::build(None, env(&[("MEILI_REQUEST_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(err, MeiliError::Config(_)));
    }

    #[test]
    fn test_transport_config() {
        let config = ClientConfig::new("http://localhost:7700")
            .with_api_key("masterKey")
            .with_request_timeout(Duration::from_secs(3));
        let transport = config.transport_config().unwrap();
        assert_eq!(transport.api_key.as_deref(), Some("masterKey"));
        assert_eq!(transport.request_timeout, Duration::from_secs(3));
        assert_eq!(transport.base_url.as_str(), "http://localhost:7700/");
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let err = ClientConfig::new("::not a url::").transport_config().unwrap_err();
        assert!(matches!(err, MeiliError::Config(_)), "got {:?}", err);
    }

    #[test]
    fn test_invalid_api_key_is_config_error() {
        let err = ClientConfig::new(DEFAULT_URL)
            .with_api_key("master\nKey")
            .transport_config()
            .and_then(|c| meili_infra_http::HttpTransport::new(c).map_err(config_error))
            .err()
            .expect("key with a newline must be rejected");
        assert!(matches!(err, MeiliError::Config(_)), "got {:?}", err);
    }

    #[test]
    fn test_sub_millisecond_durations_round_up() {
        let config = ClientConfig::new(DEFAULT_URL)
            .with_request_timeout(Duration::from_micros(1500))
            .with_poll_options(PollOptions::new(
                Duration::from_secs(1),
                Duration::from_micros(500),
            ));

        assert_eq!(config.poll_interval_ms, 1);
        assert_eq!(config.poll_timeout_ms, 1000);
        assert_eq!(config.request_timeout_ms, 2);
        assert!(config.poll_options().validate().is_ok());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_durations_fail_validation() {
        let config = ClientConfig::new(DEFAULT_URL)
            .with_poll_options(PollOptions::new(Duration::from_secs(1), Duration::ZERO));
        assert!(matches!(config.validate(), Err(MeiliError::Config(_))));

        let config = ClientConfig::new(DEFAULT_URL).with_request_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(MeiliError::Config(_))));
    }
}
