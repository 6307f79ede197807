//! Wiring of the running backend.

use std::sync::Arc;

use axum::Router;
use dma_core::{HttpError, QueryHandler};
use dma_query::DataSource;
use dma_transport::{
    http::ReqwestTransport,
    server::create_router,
};
use tower_http::cors::CorsLayer;

use crate::config::{Config, ServerConfig};

/// Data source talking to the configured agent over `reqwest`.
///
/// # Errors
/// Returns error if the HTTP client cannot be built.
pub fn datasource(config: &Config) -> Result<DataSource<ReqwestTransport>, HttpError> {
    let transport = ReqwestTransport::new(config.transport_options())?;
    Ok(DataSource::new(
        transport,
        config.agent.url.trim_end_matches('/'),
        config.query.clone(),
    ))
}

/// HTTP router for a data source.
#[must_use]
pub fn router<Q>(handler: Arc<Q>, server: &ServerConfig) -> Router
where
    Q: QueryHandler + 'static,
{
    let router = create_router(handler);
    if server.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Resolve on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
