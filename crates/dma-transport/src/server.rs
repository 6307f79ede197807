//! HTTP surface through which the host reaches the data source.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use dma_core::{HealthCheck, QueryHandler, QueryRequest, QueryResponse};
use tower_http::trace::TraceLayer;

/// Router state.
pub struct ServerState<Q> {
    /// Data source answering the requests.
    pub handler: Arc<Q>,
}

impl<Q> Clone for ServerState<Q> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

/// `POST /query`
pub async fn query_handler<Q>(
    State(state): State<ServerState<Q>>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse>
where
    Q: QueryHandler + 'static,
{
    tracing::debug!(targets = request.targets.len(), "query request");
    Json(state.handler.query(request).await)
}

/// `GET /health`
///
/// Responds 200 when the agent is reachable, 503 otherwise.
pub async fn health_handler<Q>(State(state): State<ServerState<Q>>) -> (StatusCode, Json<HealthCheck>)
where
    Q: QueryHandler + 'static,
{
    let check = state.handler.check_health().await;
    let status = if check.is_success() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(check))
}

/// Create the data source router.
///
/// # Example
/// ```ignore
/// let app = create_router(Arc::new(datasource));
/// axum::serve(listener, app).await?;
/// ```
#[must_use]
pub fn create_router<Q>(handler: Arc<Q>) -> Router
where
    Q: QueryHandler + 'static,
{
    Router::new()
        .route("/query", post(query_handler::<Q>))
        .route("/health", get(health_handler::<Q>))
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState { handler })
}
