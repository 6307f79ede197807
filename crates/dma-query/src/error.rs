//! Query error.

use dma_core::FrameError;
use dma_transport::ApiError;
use thiserror::Error;

/// Failure of a single query.
///
/// The `Display` output is what the host shows for the query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid trend request.")]
    InvalidTrend,
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// Error reported by the agent inside an otherwise successful reply.
    #[error("{0}")]
    Remote(String),
    #[error("Query timed out after {0}s")]
    Timeout(u64),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}
