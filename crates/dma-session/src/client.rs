//! Authenticated calls to the agent.

use std::sync::Arc;

use dma_core::HttpTransport;
use dma_transport::{
    ApiError, ApiSurface, WebApi,
    protocol::{CONNECTION_FIELD, requires_authentication},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::SessionManager;

/// Where a call stands.
enum Step {
    Send,
    Reauthenticate,
    Replay,
}

/// Web API client that injects the connection token and recovers once
/// from an expired session.
pub struct ApiClient<H> {
    api: Arc<WebApi<H>>,
    session: SessionManager<H>,
}

impl<H> ApiClient<H>
where
    H: HttpTransport + 'static,
{
    /// Create a client for the agent at `base_url`.
    #[must_use]
    pub fn new(http: H, base_url: impl Into<String>) -> Self {
        let api = Arc::new(WebApi::new(http, base_url));
        Self {
            session: SessionManager::new(Arc::clone(&api)),
            api,
        }
    }

    /// The session manager owning the connection token.
    #[must_use]
    pub const fn session(&self) -> &SessionManager<H> {
        &self.session
    }

    /// Call `method` and decode the reply.
    ///
    /// When a payload is given and the method needs authentication, the
    /// connection token is added under `connection`, authenticating first if
    /// there is none. A session-invalid fault triggers one forced
    /// re-authentication and one replay with the fresh token.
    ///
    /// # Errors
    /// - [`ApiError::NoConnection`] if no token could be obtained (nothing is sent)
    /// - [`ApiError::ConnectionSetup`] if the initial authentication, or a running
    ///   attempt the call waited on, failed
    /// - [`ApiError::RequestFailed`] if re-authentication before the replay failed
    /// - the classified failure of the request otherwise
    pub async fn call<T: DeserializeOwned>(
        &self,
        surface: ApiSurface,
        method: &str,
        mut payload: Option<Map<String, Value>>,
    ) -> Result<T, ApiError> {
        if requires_authentication(method) {
            if let Some(payload) = payload.as_mut() {
                let token = self.connection_token().await?;
                payload.insert(CONNECTION_FIELD.to_string(), Value::String(token));
            }
        }

        let mut step = Step::Send;
        loop {
            step = match step {
                Step::Send => match self.api.send(surface, method, payload.as_ref()).await {
                    Ok(d) => return decode(method, d),
                    Err(e) if e.is_session_invalid() => {
                        tracing::debug!(method, "session expired, reconnecting");
                        Step::Reauthenticate
                    }
                    Err(e) => return Err(e.settle()),
                },
                Step::Reauthenticate => {
                    let token = match self.session.authenticate(true).await {
                        Ok(token) if !token.is_empty() => token,
                        _ => return Err(ApiError::RequestFailed),
                    };
                    if let Some(payload) = payload.as_mut() {
                        payload.insert(CONNECTION_FIELD.to_string(), Value::String(token));
                    }
                    Step::Replay
                }
                Step::Replay => {
                    return match self.api.send(surface, method, payload.as_ref()).await {
                        Ok(d) => decode(method, d),
                        Err(e) => Err(e.settle()),
                    };
                }
            };
        }
    }

    async fn connection_token(&self) -> Result<String, ApiError> {
        if let Some(token) = self.session.current_token().await? {
            return Ok(token);
        }
        let token = self.session.authenticate(true).await?;
        if token.is_empty() {
            return Err(ApiError::NoConnection);
        }
        Ok(token)
    }
}

fn decode<T: DeserializeOwned>(method: &str, d: Value) -> Result<T, ApiError> {
    serde_json::from_value(d).map_err(|e| ApiError::InvalidResponse {
        method: method.to_string(),
        reason: e.to_string(),
    })
}
