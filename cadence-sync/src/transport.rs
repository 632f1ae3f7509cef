//! Request descriptors and the transport seam.
//!
//! Descriptors are immutable: a retry is a fresh descriptor with an
//! explicit attempt counter, never a mutable flag on a shared request. The
//! `Transport` trait is the seam the gateway talks through, so tests swap
//! the network for a double.

use async_trait::async_trait;
use cadence_core::TransportError;
use serde_json::Value;
use std::time::Duration;

use crate::config::SyncConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Whether a 401 on this request may be recovered by the refresh protocol.
/// Auth-surface requests (login, signup, refresh) never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Standard,
    Auth,
}

/// Immutable description of one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub kind: RequestKind,
    /// How many times this request has already been transmitted. The
    /// gateway retries a refreshed request exactly once.
    pub attempt: u8,
}

impl RequestDescriptor {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            kind: RequestKind::Standard,
            attempt: 0,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
            kind: RequestKind::Standard,
            attempt: 0,
        }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Patch,
            path: path.into(),
            body: Some(body),
            kind: RequestKind::Standard,
            attempt: 0,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
            kind: RequestKind::Standard,
            attempt: 0,
        }
    }

    /// Mark as an auth-surface request.
    pub fn auth(mut self) -> Self {
        self.kind = RequestKind::Auth;
        self
    }

    /// The descriptor for the single retry after a successful refresh.
    pub fn next_attempt(&self) -> Self {
        let mut next = self.clone();
        next.attempt += 1;
        next
    }
}

/// Raw reply the gateway interprets: status plus the parsed JSON body
/// (`Value::Null` when the body was empty or not JSON).
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: Value,
}

impl HttpReply {
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The outbound network seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transmit one request, attaching `bearer` when present. Returns the
    /// reply for any HTTP status; only connection-level problems are errors.
    async fn execute(
        &self,
        request: &RequestDescriptor,
        bearer: Option<&str>,
    ) -> Result<HttpReply, TransportError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl HttpTransport {
    pub fn new(config: &SyncConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|err| TransportError::Network {
                reason: err.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout_ms: config.request_timeout_ms,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: &RequestDescriptor,
        bearer: Option<&str>,
    ) -> Result<HttpReply, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(bearer) = bearer {
            builder = builder.bearer_auth(bearer);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                TransportError::Network {
                    reason: err.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|err| TransportError::Network {
            reason: err.to_string(),
        })?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(HttpReply { status, body })
    }
}
