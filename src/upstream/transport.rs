//! Transport Module
//!
//! The single seam between the fetch pipeline and the network. Production code
//! uses [`ReqwestTransport`]; tests plug in scripted implementations.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::de::DeserializeOwned;

use crate::error::{FoodError, Result};

// == Request / Response ==
/// One outbound GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub url: String,
    pub user_agent: String,
}

impl UpstreamRequest {
    pub fn new(url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// Status line and body of an upstream answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    /// 200 OK with a body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, "OK", body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(FoodError::from)
    }
}

// == Transport Error ==
/// Failure classes a transport can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request timed out inside the transport
    Timeout,
    /// Could not connect (refused, DNS, connect timeout)
    Connect,
    /// Connection dropped mid-request (reset, truncated body)
    Interrupted,
    /// Anything else; never retried
    Other,
}

/// Network-level failure, before any HTTP status was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Timeouts, connect failures and resets are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, TransportErrorKind::Other)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_request() || err.is_body() {
            TransportErrorKind::Interrupted
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

// == Transport ==
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one GET. Non-2xx statuses are returned, not raised.
    async fn get(
        &self,
        request: &UpstreamRequest,
    ) -> std::result::Result<UpstreamResponse, TransportError>;
}

// == Reqwest Transport ==
/// [`Transport`] backed by a shared `reqwest::Client`.
///
/// The per-attempt deadline is enforced by the fetcher, so the client itself
/// is built without a timeout.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FoodError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wraps an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        request: &UpstreamRequest,
    ) -> std::result::Result<UpstreamResponse, TransportError> {
        let response = self
            .client
            .get(&request.url)
            .header(USER_AGENT, &request.user_agent)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.text().await?;

        Ok(UpstreamResponse::new(status.as_u16(), status_text, body))
    }
}
