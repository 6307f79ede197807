//! Host-facing request and response envelopes.

use serde::{Deserialize, Serialize};

use crate::{Frame, Query};

/// Requested time range, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range.
    pub from: i64,
    /// End of the range.
    pub to: i64,
}

impl TimeRange {
    /// Create a new range.
    #[must_use]
    pub const fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }
}

/// A query execution request from the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Time range the queries apply to.
    pub range: TimeRange,

    /// IANA timezone name, empty or `browser` for the local timezone.
    #[serde(default)]
    pub timezone: String,

    /// Upper bound on the number of rows per GQI query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_data_points: Option<usize>,

    /// Queries to execute.
    #[serde(default)]
    pub targets: Vec<Query>,
}

/// Outcome of one query, positionally matching the request's targets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Identifier of the query.
    pub ref_id: String,
    /// The frame, when the query succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<Frame>,
    /// Human-readable failure, when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    /// Successful slot.
    #[must_use]
    pub fn ok(frame: Frame) -> Self {
        Self {
            ref_id: frame.ref_id.clone(),
            frame: Some(frame),
            error: None,
        }
    }

    /// Failed slot.
    #[must_use]
    pub fn failed(ref_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            frame: None,
            error: Some(error.into()),
        }
    }
}

/// Response to a [`QueryRequest`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResponse {
    /// One entry per target, in request order.
    pub data: Vec<QueryResult>,
}

/// Connectivity test status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Success,
    Error,
}

/// Result of a connectivity test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub message: String,
}

impl HealthCheck {
    /// Successful check.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Success,
            message: message.into(),
        }
    }

    /// Failed check.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            message: message.into(),
        }
    }

    /// Whether the check passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == HealthStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::QueryKind;

    #[test]
    fn test_request_deserialization() {
        let request: QueryRequest = serde_json::from_value(json!({
            "range": {"from": 1_700_000_000_000_i64, "to": 1_700_003_600_000_i64},
            "timezone": "browser",
            "maxDataPoints": 500,
            "targets": [
                {"refId": "A", "type": "Trend", "queryText": "1/2/3"},
                {"refId": "B"}
            ]
        }))
        .unwrap();

        assert_eq!(request.range, TimeRange::new(1_700_000_000_000, 1_700_003_600_000));
        assert_eq!(request.max_data_points, Some(500));
        assert_eq!(request.targets[0].kind, QueryKind::Trend);
        assert_eq!(request.targets[1].kind, QueryKind::Gqi);
    }

    #[test]
    fn test_request_with_odd_type_tags() {
        let request: QueryRequest = serde_json::from_value(json!({
            "range": {"from": 0, "to": 1},
            "targets": [
                {"refId": "A", "type": 1},
                {"refId": "B", "type": {"kind": "Trend"}}
            ]
        }))
        .unwrap();

        assert_eq!(request.targets.len(), 2);
        assert!(request.targets.iter().all(|t| t.kind == QueryKind::Gqi));
    }

    #[test]
    fn test_result_serialization() {
        let failed = serde_json::to_value(QueryResult::failed("A", "Invalid trend request.")).unwrap();
        assert_eq!(failed, json!({"refId": "A", "error": "Invalid trend request."}));

        let ok = serde_json::to_value(QueryResult::ok(Frame::new("B"))).unwrap();
        assert_eq!(ok, json!({"refId": "B", "frame": {"refId": "B", "fields": []}}));
    }

    #[test]
    fn test_health_check() {
        assert!(HealthCheck::success("Success").is_success());
        let value = serde_json::to_value(HealthCheck::error("down")).unwrap();
        assert_eq!(value, json!({"status": "error", "message": "down"}));
    }
}
