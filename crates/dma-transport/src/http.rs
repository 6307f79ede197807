//! `reqwest`-backed HTTP transport.
//!
//! Stands in for the host's data source proxy when the backend runs on its
//! own: it forwards requests to the agent and, when credentials are
//! configured, fills in the `ConnectApp` body the proxy would normally
//! supply.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use dma_core::{HttpError, HttpRequest, HttpResponse, HttpTransport};
use serde_json::json;

use crate::protocol::CONNECT_APP;

/// Client application name reported to the agent.
pub const CLIENT_APP_NAME: &str = "Grafana";

/// Login for the agent.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Options for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Accept invalid TLS certificates (self-signed agents).
    pub accept_invalid_certs: bool,
    /// Login injected into `ConnectApp` requests.
    pub credentials: Option<Credentials>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            credentials: None,
        }
    }
}

/// HTTP transport on top of `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
    credentials: Option<Credentials>,
}

impl ReqwestTransport {
    /// Build a transport.
    ///
    /// # Errors
    /// Returns error if the underlying client cannot be built.
    pub fn new(options: TransportOptions) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()
            .map_err(|e| HttpError::Other(e.to_string()))?;

        Ok(Self {
            client,
            credentials: options.credentials,
        })
    }

    fn login_body(&self, request: &HttpRequest) -> Option<String> {
        if request.body.is_some() || !request.url.ends_with(CONNECT_APP) {
            return None;
        }
        self.credentials.as_ref().map(|c| {
            json!({
                "login": c.username,
                "password": c.password,
                "clientAppName": CLIENT_APP_NAME,
            })
            .to_string()
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let login = self.login_body(&request);
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = login {
            builder = builder
                .header("Content-Type", "application/json")
                .body(body);
        } else if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_error)?;
        Ok(HttpResponse { status, body })
    }
}

fn map_error(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else if e.is_connect() {
        HttpError::Connect(e.to_string())
    } else {
        HttpError::Other(e.to_string())
    }
}
