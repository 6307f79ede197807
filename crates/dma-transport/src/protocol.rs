//! Wire protocol of the agent's web API.
//!
//! Every call is a POST to `{base}/API/v1/{surface}/{method}` with a JSON
//! body. Successful replies wrap the payload in a single `d` field; failed
//! replies carry a fault record.

use serde::Deserialize;
use serde_json::Value;

/// Authentication method.
pub const CONNECT_APP: &str = "ConnectApp";
/// Trend series for a (table) parameter.
pub const GET_TREND_DATA: &str = "GetTrendDataForTableParameterV2";
/// Open a GQI session.
pub const OPEN_QUERY_SESSION: &str = "OpenQuerySession";
/// Fetch the next page of a GQI session.
pub const GET_NEXT_QUERY_SESSION_PAGE: &str = "GetNextQuerySessionPage";
/// Close a GQI session.
pub const CLOSE_QUERY_SESSION: &str = "CloseQuerySession";

/// Exception type the agent reports when the connection token is unknown.
pub const NO_CONNECTION_EXCEPTION: &str = "Skyline.DataMiner.Web.Common.NoConnectionWebApiException";

/// Payload field holding the connection token.
pub const CONNECTION_FIELD: &str = "connection";

/// Logical API group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiSurface {
    /// Public API, including authentication.
    Json,
    /// Internal API, including GQI sessions.
    Internal,
}

impl ApiSurface {
    /// Path segment of the surface.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "Json.asmx",
            Self::Internal => "Internal.asmx",
        }
    }
}

/// Whether `method` needs a connection token in its payload.
#[must_use]
pub fn requires_authentication(method: &str) -> bool {
    method != CONNECT_APP
}

/// Build the endpoint URL for a call.
#[must_use]
pub fn endpoint_url(base_url: &str, surface: ApiSurface, method: &str) -> String {
    format!(
        "{}/API/v1/{}/{}",
        base_url.trim_end_matches('/'),
        surface.as_str(),
        method
    )
}

/// Successful reply envelope.
#[derive(Debug, Deserialize)]
pub struct WebApiResponse {
    #[serde(default)]
    pub d: Value,
}

/// Fault body of a failed reply.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebApiFault {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub exception_type: Option<String>,
}

impl WebApiFault {
    /// Parse a fault body, tolerating bodies that are not faults at all.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Whether the agent rejected the connection token.
    #[must_use]
    pub fn is_session_invalid(&self) -> bool {
        self.exception_type.as_deref() == Some(NO_CONNECTION_EXCEPTION)
    }

    /// Non-empty server message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}
