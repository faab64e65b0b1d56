//! HTTP transport for the data API.
//!
//! # Responsibilities
//! - Resolve request URLs against the configured base URL
//! - Execute GET and POST requests with a timeout
//! - Map HTTP status >= 400 and transport failures to `NetworkError`
//!
//! # Design Decisions
//! - `Transport` is a trait so tests and embedders can supply their own
//! - Bodies are decoded as JSON, falling back to a JSON string of the raw text

use std::fmt;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::TransportConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    /// JSON body, sent for POST only.
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
        }
    }
}

/// Request failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Executes data API requests.
pub trait Transport: Send + Sync {
    fn execute(&self, request: TransportRequest) -> BoxFuture<'_, Result<Value, NetworkError>>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, NetworkError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| NetworkError::InvalidUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NetworkError::Transport(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Absolute URLs pass through; relative ones are joined onto the base URL.
    pub fn resolve(&self, url: &str) -> Result<Url, NetworkError> {
        let invalid = |reason: String| NetworkError::InvalidUrl {
            url: url.to_string(),
            reason,
        };

        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(url).map_err(|e| invalid(e.to_string())),
                None => Err(invalid("relative url and no base_url configured".to_string())),
            },
            Err(e) => Err(invalid(e.to_string())),
        }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: TransportRequest) -> BoxFuture<'_, Result<Value, NetworkError>> {
        Box::pin(async move {
            let url = self.resolve(&request.url)?;
            tracing::debug!(method = %request.method, url = %url, "Sending request");

            let builder = match request.method {
                Method::Get => self.client.get(url),
                Method::Post => self
                    .client
                    .post(url)
                    .json(&request.body.unwrap_or(Value::Null)),
            };

            let response = builder
                .send()
                .await
                .map_err(|e| NetworkError::Transport(e.to_string()))?;
            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| NetworkError::Transport(e.to_string()))?;

            if status.as_u16() >= 400 {
                return Err(NetworkError::Status {
                    code: status.as_u16(),
                    body: text,
                });
            }

            Ok(decode_body(text))
        })
    }
}

fn decode_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
