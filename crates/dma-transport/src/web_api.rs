//! Single-shot calls to the agent's web API.
//!
//! `WebApi` sends one request and classifies the outcome. It knows nothing
//! about connection tokens; injecting them and retrying on session expiry is
//! the job of the session layer built on top of it.

use dma_core::{HttpRequest, HttpTransport};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::protocol::{ApiSurface, WebApiFault, WebApiResponse, endpoint_url};

/// Web API error.
///
/// The `Display` output of each variant is the message shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("No connection to the DataMiner agent.")]
    NoConnection,
    #[error("Could not set up a connection with the DataMiner agent.")]
    ConnectionSetup,
    /// The agent no longer recognises the connection token.
    #[error("{}", .message.as_deref().unwrap_or("Request failed."))]
    SessionInvalid {
        message: Option<String>,
        status: Option<u16>,
    },
    #[error("{0}")]
    Remote(String),
    #[error("Request failed (HTTP{0})")]
    Status(u16),
    #[error("Request failed.")]
    RequestFailed,
    #[error("Failed to encode request: {0}")]
    Encode(String),
    #[error("Invalid response from {method}: {reason}")]
    InvalidResponse { method: String, reason: String },
}

impl ApiError {
    /// Whether the failure can be recovered by re-authenticating.
    #[must_use]
    pub const fn is_session_invalid(&self) -> bool {
        matches!(self, Self::SessionInvalid { .. })
    }

    /// Classify a session fault that will not be retried.
    ///
    /// The server message wins, then the HTTP status, then the generic
    /// failure. Other variants are returned unchanged.
    #[must_use]
    pub fn settle(self) -> Self {
        match self {
            Self::SessionInvalid {
                message: Some(message),
                ..
            } => Self::Remote(message),
            Self::SessionInvalid {
                status: Some(status),
                ..
            } => Self::Status(status),
            Self::SessionInvalid { .. } => Self::RequestFailed,
            other => other,
        }
    }
}

/// Raw web API client.
pub struct WebApi<H> {
    http: H,
    base_url: String,
}

impl<H: HttpTransport> WebApi<H> {
    /// Create a client for the agent at `base_url`.
    #[must_use]
    pub fn new(http: H, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Base URL of the agent.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and unwrap the `d` field of the reply.
    ///
    /// # Errors
    /// Returns a classified [`ApiError`] for transport failures, non-2xx
    /// replies and undecodable bodies.
    pub async fn send(
        &self,
        surface: ApiSurface,
        method: &str,
        payload: Option<&Map<String, Value>>,
    ) -> Result<Value, ApiError> {
        let url = endpoint_url(&self.base_url, surface, method);
        let mut request = HttpRequest::post(&url);
        if let Some(payload) = payload {
            let body = serde_json::to_string(payload).map_err(|e| ApiError::Encode(e.to_string()))?;
            request = request.json(body);
        }

        tracing::debug!(%url, "web API request");

        let response = self.http.post(request).await.map_err(|e| {
            tracing::warn!(method, "web API transport error: {e}");
            ApiError::RequestFailed
        })?;

        if !response.is_success() {
            let fault = WebApiFault::parse(&response.body);
            tracing::debug!(
                method,
                status = response.status,
                exception = ?fault.exception_type,
                "web API fault"
            );
            return Err(classify(&fault, response.status));
        }

        let envelope: WebApiResponse =
            serde_json::from_str(&response.body).map_err(|e| ApiError::InvalidResponse {
                method: method.to_string(),
                reason: e.to_string(),
            })?;
        Ok(envelope.d)
    }
}

fn classify(fault: &WebApiFault, status: u16) -> ApiError {
    let status = (status != 0).then_some(status);
    if fault.is_session_invalid() {
        return ApiError::SessionInvalid {
            message: fault.message().map(str::to_string),
            status,
        };
    }
    if let Some(message) = fault.message() {
        return ApiError::Remote(message.to_string());
    }
    status.map_or(ApiError::RequestFailed, ApiError::Status)
}
