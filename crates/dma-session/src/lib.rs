//! Session layer for the DataMiner Agent web API.
//!
//! Provides:
//! - `SessionManager` - Owns the connection token and coalesces authentication
//! - `ApiClient` - Authenticated calls with a single replay on session expiry

pub mod client;
pub mod manager;

pub use client::ApiClient;
pub use manager::SessionManager;
