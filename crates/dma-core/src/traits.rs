//! Core traits for HTTP transport and query handling.

use async_trait::async_trait;
use thiserror::Error;

use crate::{HealthCheck, QueryRequest, QueryResponse};

/// An outbound HTTP POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Absolute URL.
    pub url: String,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Request body, if any.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Create a body-less POST.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Attach a JSON body and the matching content type.
    #[must_use]
    pub fn json(mut self, body: String) -> Self {
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        self.body = Some(body);
        self
    }

    /// Value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response to an [`HttpRequest`], whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Failure below HTTP: no status was received.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Transport error: {0}")]
    Other(String),
}

/// HTTP capability provided by the host.
///
/// The query core never talks to the network directly; it posts through
/// this trait so the host (or a test) decides how requests travel.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a POST request and return the response, whatever its status.
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        (**self).post(request).await
    }
}

/// Inbound surface of a data source.
#[async_trait]
pub trait QueryHandler: Send + Sync {
    /// Execute every query in the request.
    async fn query(&self, request: QueryRequest) -> QueryResponse;

    /// Check that the agent is reachable and accepts the configured credentials.
    async fn check_health(&self) -> HealthCheck;
}
