//! Query execution for the DataMiner Agent data source.
//!
//! Provides:
//! - `QueryRouter` - Dispatch descriptors to the trend or GQI strategy
//! - `trend` / `gqi` - The two query dialects
//! - `assembler` - Agent records to output frames
//! - `DataSource` - The `QueryHandler` the host talks to

pub mod assembler;
pub mod datasource;
pub mod error;
pub mod gqi;
pub mod options;
pub mod router;
pub mod timezone;
pub mod trend;

pub use datasource::DataSource;
pub use error::QueryError;
pub use options::QueryOptions;
pub use router::{QueryRouter, QueryScope};
