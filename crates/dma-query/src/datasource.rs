//! The data source exposed to the host.

use std::sync::Arc;

use async_trait::async_trait;
use dma_core::{HealthCheck, HttpTransport, QueryHandler, QueryRequest, QueryResponse};
use dma_session::ApiClient;

use crate::{QueryOptions, QueryRouter};

/// Message of a successful connectivity test.
pub const HEALTH_OK: &str = "Success";
/// Message when the agent answered without a connection token.
pub const HEALTH_NO_TOKEN: &str = "Cannot connect to the API on the DataMiner Agent.";

/// DataMiner Agent data source.
pub struct DataSource<H> {
    router: QueryRouter<H>,
}

impl<H> DataSource<H>
where
    H: HttpTransport + 'static,
{
    /// Create a data source for the agent reachable at `base_url` through `http`.
    #[must_use]
    pub fn new(http: H, base_url: impl Into<String>, options: QueryOptions) -> Self {
        let client = Arc::new(ApiClient::new(http, base_url));
        Self {
            router: QueryRouter::new(client, options),
        }
    }

    /// The query router.
    #[must_use]
    pub const fn router(&self) -> &QueryRouter<H> {
        &self.router
    }
}

#[async_trait]
impl<H> QueryHandler for DataSource<H>
where
    H: HttpTransport + 'static,
{
    async fn query(&self, request: QueryRequest) -> QueryResponse {
        QueryResponse {
            data: self.router.execute_all(&request).await,
        }
    }

    async fn check_health(&self) -> HealthCheck {
        match self.router.client().session().authenticate(false).await {
            Ok(token) if !token.is_empty() => HealthCheck::success(HEALTH_OK),
            Ok(_) => HealthCheck::error(HEALTH_NO_TOKEN),
            Err(e) => {
                tracing::warn!("health check failed: {e}");
                HealthCheck::error(format!("JSON API: {e}"))
            }
        }
    }
}
