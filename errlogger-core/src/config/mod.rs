//! Configuration for errlogger
//!
//! A logger is described by a single [`LoggerConfig`]. The only setting that
//! changes behavior wholesale is `endpoint_url`: without it the logger is
//! inert, nothing is installed and nothing is queued. Everything else tunes
//! what gets sent and how failed sends are paced.
//!
//! Configuration can be built in code, loaded from a TOML file, or read from
//! `ERRLOGGER_*` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{ErrorLoggerError, ErrorLoggerResult};

pub mod defaults;
pub mod retry;

pub use defaults::*;
pub use retry::RetryConfig;

/// Root configuration for an error logger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Collector URL that receives one POST per error. `None` disables the logger.
    pub endpoint_url: Option<String>,

    /// Static parameters merged into every record
    pub additional_params: BTreeMap<String, String>,

    /// Value reported as `pageUrl`; defaults to the running executable
    pub page_url: Option<String>,

    /// Per-request timeout; a request exceeding it counts as a failed send
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Upper bound on queued records; the oldest record not in flight is dropped past it
    pub max_queue_len: Option<usize>,

    /// Pacing of resends after a failure
    pub retry: RetryConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            additional_params: BTreeMap::new(),
            page_url: None,
            request_timeout: duration_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_queue_len: None,
            retry: RetryConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// Create a configuration pointing at `endpoint_url`
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.into()),
            ..Self::default()
        }
    }

    /// Whether an endpoint is configured at all
    pub fn is_enabled(&self) -> bool {
        self.endpoint().is_some()
    }

    /// Trimmed endpoint URL, treating a blank value as absent
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> ErrorLoggerResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_ENDPOINT_URL) {
            config.endpoint_url = Some(url);
        }

        if let Ok(url) = std::env::var(ENV_PAGE_URL) {
            config.page_url = Some(url);
        }

        if let Ok(params) = std::env::var(ENV_PARAMS) {
            config.additional_params = parse_params(&params)?;
        }

        config.request_timeout =
            parse_duration_secs_from_env(ENV_REQUEST_TIMEOUT_SECS, config.request_timeout);

        if let Ok(val) = std::env::var(ENV_MAX_QUEUE_LEN) {
            config.max_queue_len = Some(val.parse().map_err(|_| {
                ErrorLoggerError::configuration(ENV_MAX_QUEUE_LEN, "expected a positive integer")
            })?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ErrorLoggerResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents).map_err(|e| ErrorLoggerError::ConfigParse {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ErrorLoggerResult<()> {
        if let Some(endpoint) = self.endpoint() {
            let url = url::Url::parse(endpoint)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ErrorLoggerError::configuration(
                    "endpoint_url",
                    format!("unsupported scheme '{}', expected http or https", url.scheme()),
                ));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(ErrorLoggerError::configuration(
                "request_timeout",
                "must be greater than zero",
            ));
        }

        if self.max_queue_len == Some(0) {
            return Err(ErrorLoggerError::configuration(
                "max_queue_len",
                "must be at least 1 when set",
            ));
        }

        if self.additional_params.keys().any(|key| key.is_empty()) {
            return Err(ErrorLoggerError::configuration(
                "additional_params",
                "parameter names cannot be empty",
            ));
        }

        self.retry.validate()
    }
}

/// Builder for LoggerConfig
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
        }
    }

    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint_url = Some(url.into());
        self
    }

    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.config.page_url = Some(url.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .additional_params
            .insert(key.into(), value.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn max_queue_len(mut self, len: usize) -> Self {
        self.config.max_queue_len = Some(len);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn build(self) -> ErrorLoggerResult<LoggerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for LoggerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `key=value` pairs separated by commas
pub fn parse_params(raw: &str) -> ErrorLoggerResult<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| {
                    ErrorLoggerError::configuration(
                        "additional_params",
                        format!("expected key=value, got '{}'", pair),
                    )
                })
        })
        .collect()
}

pub(crate) fn parse_duration_secs_from_env(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
