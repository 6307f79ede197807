//! Records exchanged with the agent's web API.
//!
//! Field names follow the agent's PascalCase JSON. Every field is optional:
//! the agent omits whatever does not apply, and the query strategies branch
//! on presence.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to an object on the agent (element, view, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DmaObject {
    #[serde(rename = "DataMinerID", default, skip_serializing_if = "Option::is_none")]
    pub dataminer_id: Option<i64>,
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Display/value pair used for discrete parameter values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterDiscreet {
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// Trend series returned by `GetTrendDataForTableParameterV2`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrendData {
    #[serde(default)]
    pub avg: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub min: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub max: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub timestamps: Option<Vec<Option<i64>>>,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub logarithmic: Option<bool>,
    #[serde(default)]
    pub no_data: Option<bool>,
    #[serde(default)]
    pub exceptions: Option<Vec<ParameterDiscreet>>,
    #[serde(default)]
    pub discreets: Option<Vec<ParameterDiscreet>>,
}

impl TrendData {
    /// Business error reported by the agent, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// Column type as seen by clients of the GQI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientColumnType {
    Number,
    String,
    Guid,
    Boolean,
    Date,
    /// Any type this crate does not know about.
    #[serde(other)]
    Other,
}

/// Description of one GQI result column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GqiColumnInfo {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub client_type: Option<ClientColumnType>,
    /// Server-side type (`double`, `datetime`, ...), informational only.
    #[serde(default)]
    pub server_type: Option<String>,
    #[serde(default)]
    pub origin: Option<DmaObject>,
    #[serde(rename = "hidden", default)]
    pub hidden: Option<bool>,
}

/// Link between a column and a row identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GqiColumnLink {
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub link: Option<i64>,
}

/// Server-side query session opened by `OpenQuerySession`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GqiSessionInfo {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(default)]
    pub columns: Option<Vec<GqiColumnInfo>>,
    #[serde(default)]
    pub column_links: Option<Vec<GqiColumnLink>>,
}

/// One GQI cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GqiCell {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub display_value: Option<String>,
}

/// Identifier attached to a GQI row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GqiRowIdentifier {
    #[serde(rename = "ID", default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub value: Option<DmaObject>,
}

/// One GQI row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GqiRow {
    #[serde(default)]
    pub cells: Option<Vec<GqiCell>>,
    #[serde(default)]
    pub identifiers: Option<Vec<GqiRowIdentifier>>,
}

/// One page returned by `GetNextQuerySessionPage`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GqiResultPage {
    #[serde(default)]
    pub rows: Option<Vec<Option<GqiRow>>>,
    #[serde(default)]
    pub is_last: Option<bool>,
}

impl GqiResultPage {
    /// Whether the agent marked this as the final page.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.is_last.unwrap_or(false)
    }

    /// Whether the page carries no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.as_ref().is_none_or(Vec::is_empty)
    }
}
