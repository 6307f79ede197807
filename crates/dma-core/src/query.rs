//! Query descriptors.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// GQI query used when a descriptor carries no query text.
pub const DEFAULT_GQI_QUERY: &str = r#"{
    "__type": "Skyline.DataMiner.Web.Common.v1.DMAGenericInterfaceQuery",
    "ID": "Elements",
    "Version": 0.19,
    "Options": [],
    "Child": null
}"#;

/// Which query dialect a descriptor uses.
///
/// Only the exact tag `Trend` selects the trend dialect. Every other tag,
/// including a missing one, runs as a GQI query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryKind {
    /// Flat trend-data lookup for a single parameter.
    Trend,
    /// Generic Query Interface: paged tabular query.
    #[default]
    Gqi,
}

impl QueryKind {
    /// Tag used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trend => "Trend",
            Self::Gqi => "GQI",
        }
    }

    /// Resolve a wire tag.
    #[must_use]
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("Trend") => Self::Trend,
            _ => Self::Gqi,
        }
    }
}

impl Serialize for QueryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for QueryKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from_tag(tag.as_ref().and_then(serde_json::Value::as_str)))
    }
}

/// A single query issued by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Host-assigned identifier, echoed on the resulting frame.
    #[serde(default)]
    pub ref_id: String,

    /// Query dialect.
    #[serde(default, rename = "type")]
    pub kind: QueryKind,

    /// Slash path (trend) or JSON document (GQI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_text: Option<String>,

    /// Ask the agent to convert units dynamically (GQI only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_dynamic_units: Option<bool>,
}

impl Query {
    /// Create a GQI query.
    #[must_use]
    pub fn gqi(ref_id: impl Into<String>, query_text: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            kind: QueryKind::Gqi,
            query_text: Some(query_text.into()),
            use_dynamic_units: None,
        }
    }

    /// Create a trend query from a `dmaId/elementId/parameterId[/index]` path.
    #[must_use]
    pub fn trend(ref_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            kind: QueryKind::Trend,
            query_text: Some(path.into()),
            use_dynamic_units: None,
        }
    }

    /// Query text, falling back to the default GQI query.
    #[must_use]
    pub fn text(&self) -> &str {
        self.query_text.as_deref().unwrap_or(DEFAULT_GQI_QUERY)
    }

    /// Dynamic units flag, defaulting to enabled.
    #[must_use]
    pub fn dynamic_units(&self) -> bool {
        self.use_dynamic_units.unwrap_or(true)
    }
}
