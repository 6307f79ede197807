//! Tunables for query execution.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Rows requested per GQI page.
pub const DEFAULT_PAGE_SIZE: usize = 300;
/// Row limit for GQI queries when the host sets none.
pub const DEFAULT_MAX_POINTS: usize = 200;

/// Query execution options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Rows requested per `GetNextQuerySessionPage` call.
    pub page_size: usize,
    /// Row limit used when the request has no (or a zero) `maxDataPoints`.
    pub default_max_points: usize,
    /// Overall time allowed for one GQI query, in seconds.
    pub timeout_secs: Option<u64>,
    /// Timezone used when the host asks for the local one.
    pub timezone: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            default_max_points: DEFAULT_MAX_POINTS,
            timeout_secs: None,
            timezone: None,
        }
    }
}

impl QueryOptions {
    /// Row limit for a request.
    #[must_use]
    pub fn point_limit(&self, max_data_points: Option<usize>) -> usize {
        max_data_points
            .filter(|&n| n > 0)
            .unwrap_or(self.default_max_points)
    }

    /// Query timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
