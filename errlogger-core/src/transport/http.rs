//! Form-encoded HTTP POST transport

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::trace;
use url::form_urlencoded;

use super::Transport;
use crate::config::{LoggerConfig, DEFAULT_CONNECT_TIMEOUT_SECS, FORM_CONTENT_TYPE};
use crate::error::{ErrorLoggerError, ErrorLoggerResult};

/// POSTs each record as `application/x-www-form-urlencoded` to a fixed endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> ErrorLoggerResult<Self> {
        let connect_timeout =
            std::cmp::min(request_timeout, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS));

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ErrorLoggerError::ClientBuild(Box::new(e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Build a transport for the configured endpoint, or `None` when no endpoint is set
    pub fn from_config(config: &LoggerConfig) -> ErrorLoggerResult<Option<Self>> {
        match config.endpoint() {
            Some(endpoint) => Self::new(endpoint, config.request_timeout).map(Some),
            None => Ok(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, fields: &[(String, String)]) -> ErrorLoggerResult<()> {
        let body = encode_form(fields);
        trace!(endpoint = %self.endpoint, bytes = body.len(), "POST error record");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| ErrorLoggerError::request(&self.endpoint, e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ErrorLoggerError::UnexpectedStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            })
        }
    }
}

/// Serialize pairs as `key=value` joined by `&`, percent-encoding each component
pub fn encode_form(fields: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}
