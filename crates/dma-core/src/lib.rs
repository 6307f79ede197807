//! Core data model for the DataMiner Agent data source.
//!
//! This crate provides the fundamental building blocks:
//! - `Query` / `QueryKind` - Query descriptors sent by the host
//! - `QueryRequest` / `QueryResponse` - The host-facing request envelope
//! - `Frame` - Typed, column-oriented output table
//! - `types` - Records returned by the agent's web API
//! - `HttpTransport` and `QueryHandler` traits

pub mod context;
pub mod frame;
pub mod query;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use context::{HealthCheck, HealthStatus, QueryRequest, QueryResponse, QueryResult, TimeRange};
pub use frame::{Field, FieldType, Frame, FrameError};
pub use query::{Query, QueryKind};
pub use traits::{HttpError, HttpRequest, HttpResponse, HttpTransport, QueryHandler};
