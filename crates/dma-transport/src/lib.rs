//! Transport layer for the DataMiner Agent data source.
//!
//! Provides:
//! - Web API wire protocol (surfaces, methods, `d` envelope, faults)
//! - `WebApi` - single-shot calls with failure classification
//! - `reqwest` HTTP transport (feature: reqwest)
//! - Inbound HTTP router for the host (feature: server)

pub mod protocol;
pub mod web_api;

#[cfg(feature = "reqwest")]
pub mod http;

#[cfg(feature = "server")]
pub mod server;

pub use protocol::ApiSurface;
pub use web_api::{ApiError, WebApi};
