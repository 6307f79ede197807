//! Dispatch of query descriptors to their strategy.

use std::sync::Arc;

use dma_core::{Frame, HttpTransport, Query, QueryKind, QueryRequest, QueryResult, TimeRange};
use dma_session::ApiClient;
use futures::future::join_all;

use crate::{QueryError, QueryOptions, gqi, trend};

/// Request-wide parameters shared by every descriptor.
#[derive(Debug, Clone, Copy)]
pub struct QueryScope<'a> {
    pub range: TimeRange,
    pub timezone: &'a str,
    pub max_data_points: Option<usize>,
}

impl<'a> QueryScope<'a> {
    /// Scope of a host request.
    #[must_use]
    pub fn of(request: &'a QueryRequest) -> Self {
        Self {
            range: request.range,
            timezone: &request.timezone,
            max_data_points: request.max_data_points,
        }
    }
}

/// Routes each descriptor to the trend or GQI strategy.
pub struct QueryRouter<H> {
    client: Arc<ApiClient<H>>,
    options: QueryOptions,
}

impl<H> QueryRouter<H>
where
    H: HttpTransport + 'static,
{
    /// Create a router.
    #[must_use]
    pub const fn new(client: Arc<ApiClient<H>>, options: QueryOptions) -> Self {
        Self { client, options }
    }

    /// The API client queries run on.
    #[must_use]
    pub fn client(&self) -> &ApiClient<H> {
        &self.client
    }

    /// Execute one descriptor.
    ///
    /// # Errors
    /// Returns the failure of the selected strategy.
    pub async fn execute(&self, query: &Query, scope: &QueryScope<'_>) -> Result<Frame, QueryError> {
        match query.kind {
            QueryKind::Trend => trend::run(&self.client, query, scope.range).await,
            QueryKind::Gqi => gqi::run(&self.client, &self.options, query, scope).await,
        }
    }

    /// Execute every target of a request concurrently.
    ///
    /// Results are positional: slot `i` answers target `i`. A failing
    /// target only fails its own slot.
    pub async fn execute_all(&self, request: &QueryRequest) -> Vec<QueryResult> {
        let scope = QueryScope::of(request);
        let runs = request.targets.iter().map(|query| async move {
            match self.execute(query, &scope).await {
                Ok(frame) => QueryResult::ok(frame),
                Err(e) => {
                    tracing::warn!(ref_id = %query.ref_id, kind = query.kind.as_str(), "query failed: {e}");
                    QueryResult::failed(query.ref_id.as_str(), e.to_string())
                }
            }
        });
        join_all(runs).await
    }
}
