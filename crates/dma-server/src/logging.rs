//! Logging initialization.
//!
//! Filter directives come from `DMA_LOG` (for example
//! `DMA_LOG=dma_session=debug,info`); the default level is `info`.

use tracing_subscriber::{EnvFilter, fmt};

/// Variable holding the filter directives.
pub const ENV_LOG: &str = "DMA_LOG";

/// Filter from `DMA_LOG`, or `info`.
#[must_use]
pub fn filter() -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber, writing to stderr.
///
/// # Panics
/// Panics if a global subscriber is already set.
pub fn init() {
    fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .init();
}
