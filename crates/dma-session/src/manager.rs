//! Connection token ownership and coalesced authentication.

use std::sync::Arc;

use dma_core::HttpTransport;
use dma_transport::{
    ApiError, ApiSurface, WebApi,
    protocol::CONNECT_APP,
};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::sync::Mutex;

type AuthAttempt = Shared<BoxFuture<'static, Result<String, ApiError>>>;

#[derive(Default)]
struct AuthState {
    token: String,
    attempt: Option<AuthAttempt>,
    connecting: bool,
}

/// Owner of the connection token.
///
/// At most one `ConnectApp` request is in flight at any time. Callers that
/// need a token while an attempt is running wait on that same attempt.
pub struct SessionManager<H> {
    api: Arc<WebApi<H>>,
    state: Arc<Mutex<AuthState>>,
}

impl<H> SessionManager<H>
where
    H: HttpTransport + 'static,
{
    /// Create a manager with no token.
    #[must_use]
    pub fn new(api: Arc<WebApi<H>>) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(AuthState::default())),
        }
    }

    /// Obtain a connection token.
    ///
    /// The current token is dropped first. A new attempt starts when none was
    /// ever made, or when `force_retry` is set and no attempt is running;
    /// otherwise the caller waits on the latest attempt, which may already
    /// have settled.
    ///
    /// The returned token may be empty if the agent answered without one.
    ///
    /// # Errors
    /// Returns [`ApiError::ConnectionSetup`] if the attempt failed.
    pub async fn authenticate(&self, force_retry: bool) -> Result<String, ApiError> {
        let attempt = {
            let mut state = self.state.lock().await;
            state.token.clear();
            let reuse = !force_retry || state.connecting;
            match state.attempt.clone() {
                Some(attempt) if reuse => attempt,
                _ => {
                    let attempt = self.start_attempt();
                    state.attempt = Some(attempt.clone());
                    state.connecting = true;
                    attempt
                }
            }
        };

        let token = attempt.await?;
        self.state.lock().await.token.clone_from(&token);
        Ok(token)
    }

    /// Current token, waiting for a running attempt to settle first.
    ///
    /// Returns `None` when there is no usable token.
    ///
    /// # Errors
    /// Returns [`ApiError::ConnectionSetup`] if the running attempt failed.
    pub async fn current_token(&self) -> Result<Option<String>, ApiError> {
        let running = {
            let state = self.state.lock().await;
            state
                .connecting
                .then(|| state.attempt.clone())
                .flatten()
        };
        if let Some(attempt) = running {
            attempt.await?;
        }

        let state = self.state.lock().await;
        Ok((!state.token.is_empty()).then(|| state.token.clone()))
    }

    fn start_attempt(&self) -> AuthAttempt {
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        tracing::debug!(base_url = api.base_url(), "connecting to agent");

        async move {
            let result = api
                .send(ApiSurface::Json, CONNECT_APP, None)
                .await
                .and_then(token_from);

            let mut state = state.lock().await;
            state.connecting = false;
            match result {
                Ok(token) => {
                    state.token.clone_from(&token);
                    tracing::info!(authenticated = !token.is_empty(), "connected to agent");
                    Ok(token)
                }
                Err(e) => {
                    tracing::warn!("authentication failed: {e}");
                    Err(ApiError::ConnectionSetup)
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn token_from(d: Value) -> Result<String, ApiError> {
    match d {
        Value::String(token) => Ok(token),
        Value::Null => Ok(String::new()),
        other => Err(ApiError::InvalidResponse {
            method: CONNECT_APP.to_string(),
            reason: format!("expected a token, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use dma_core::{
        HttpError,
        mock::{MockTransport, fault, reply},
    };
    use serde_json::json;

    use super::*;

    fn manager(transport: &Arc<MockTransport>) -> SessionManager<Arc<MockTransport>> {
        SessionManager::new(Arc::new(WebApi::new(Arc::clone(transport), "http://agent")))
    }

    fn numbered_tokens() -> Arc<MockTransport> {
        Arc::new(MockTransport::new(|call| {
            reply(json!(format!("token-{}", call.attempt + 1)))
        }))
    }

    #[tokio::test]
    async fn test_concurrent_authentications_share_one_request() {
        let transport = numbered_tokens();
        let manager = manager(&transport);

        let (a, b) = tokio::join!(manager.authenticate(false), manager.authenticate(false));

        assert_eq!(a.unwrap(), "token-1");
        assert_eq!(b.unwrap(), "token-1");
        assert_eq!(transport.count(CONNECT_APP), 1);
    }

    #[tokio::test]
    async fn test_forced_retry_joins_running_attempt() {
        let transport = numbered_tokens();
        let manager = manager(&transport);

        let (a, b) = tokio::join!(manager.authenticate(false), manager.authenticate(true));

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(transport.count(CONNECT_APP), 1);
    }

    #[tokio::test]
    async fn test_settled_attempt_is_reused_unless_forced() {
        let transport = numbered_tokens();
        let manager = manager(&transport);

        assert_eq!(manager.authenticate(false).await.unwrap(), "token-1");
        assert_eq!(manager.authenticate(false).await.unwrap(), "token-1");
        assert_eq!(transport.count(CONNECT_APP), 1);

        assert_eq!(manager.authenticate(true).await.unwrap(), "token-2");
        assert_eq!(manager.current_token().await.unwrap().as_deref(), Some("token-2"));
        assert_eq!(transport.count(CONNECT_APP), 2);
    }

    #[tokio::test]
    async fn test_failure_reports_connection_setup() {
        let transport = Arc::new(MockTransport::new(|_| Err(HttpError::Timeout)));
        let manager = manager(&transport);

        let err = manager.authenticate(true).await.unwrap_err();

        assert_eq!(err, ApiError::ConnectionSetup);
        assert_eq!(
            err.to_string(),
            "Could not set up a connection with the DataMiner agent."
        );
        assert!(manager.current_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_waiting_on_failed_attempt_reports_failure() {
        let transport = Arc::new(MockTransport::new(|_| fault(401, Some("bad login"), None)));
        let manager = manager(&transport);

        let (started, waited) = tokio::join!(manager.authenticate(true), manager.current_token());

        assert_eq!(started.unwrap_err(), ApiError::ConnectionSetup);
        assert_eq!(waited.unwrap_err(), ApiError::ConnectionSetup);
        assert_eq!(transport.count(CONNECT_APP), 1);
    }

    #[tokio::test]
    async fn test_remote_fault_is_not_exposed() {
        let transport = Arc::new(MockTransport::new(|_| {
            fault(500, Some("Invalid credentials"), Some("System.Exception"))
        }));
        let manager = manager(&transport);

        assert_eq!(
            manager.authenticate(false).await.unwrap_err(),
            ApiError::ConnectionSetup
        );
    }

    #[tokio::test]
    async fn test_authentication_clears_previous_token() {
        let transport = Arc::new(MockTransport::new(|call| match call.attempt {
            0 => reply(json!("token-1")),
            _ => reply(Value::Null),
        }));
        let manager = manager(&transport);

        manager.authenticate(false).await.unwrap();
        assert_eq!(manager.current_token().await.unwrap().as_deref(), Some("token-1"));

        assert_eq!(manager.authenticate(true).await.unwrap(), "");
        assert!(manager.current_token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_app_sends_no_body() {
        let transport = numbered_tokens();
        let manager = manager(&transport);

        manager.authenticate(false).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls[0].url, "http://agent/API/v1/Json.asmx/ConnectApp");
        assert!(calls[0].body.is_none());
    }

    #[test]
    fn test_token_from_rejects_objects() {
        assert!(matches!(
            token_from(json!({"token": "x"})),
            Err(ApiError::InvalidResponse { .. })
        ));
        assert_eq!(token_from(json!("abc")).unwrap(), "abc");
    }
}
