//! Standalone backend for the DataMiner Agent data source.
//!
//! Provides:
//! - `config` - TOML configuration with environment overrides
//! - `logging` - `tracing` subscriber setup
//! - `app` - Wiring of transport, data source and router

pub mod app;
pub mod config;
pub mod logging;

pub use config::{Config, ConfigError, ConfigLoader};
