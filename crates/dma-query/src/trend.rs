//! Trend queries: one averaged series for a (table) parameter.

use std::str::FromStr;

use dma_core::{Frame, HttpTransport, Query, TimeRange, types::TrendData};
use dma_session::ApiClient;
use dma_transport::{ApiSurface, protocol::GET_TREND_DATA};
use serde_json::{Map, Value, json};

use crate::{QueryError, assembler};

/// Parameter addressed by a trend query text.
///
/// The text is `dmaId/elementId/parameterId[/tableIndex]`; segments after
/// the table index are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendTarget {
    pub dma_id: i64,
    pub element_id: i64,
    pub parameter_id: i64,
    pub table_index: Option<String>,
}

impl FromStr for TrendTarget {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('/').collect();
        if segments.len() < 3 {
            return Err(QueryError::InvalidTrend);
        }
        let id = |segment: &str| {
            segment
                .trim()
                .parse::<i64>()
                .map_err(|_| QueryError::InvalidTrend)
        };

        Ok(Self {
            dma_id: id(segments[0])?,
            element_id: id(segments[1])?,
            parameter_id: id(segments[2])?,
            table_index: segments.get(3).map(|s| (*s).to_string()),
        })
    }
}

impl TrendTarget {
    /// Request payload for a time range.
    #[must_use]
    pub fn payload(&self, range: TimeRange) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("dmaID".into(), json!(self.dma_id));
        payload.insert("elementID".into(), json!(self.element_id));
        payload.insert("parameterID".into(), json!(self.parameter_id));
        payload.insert("tableIndex".into(), json!(self.table_index));
        payload.insert("utcStartTime".into(), json!(range.from));
        payload.insert("utcEndTime".into(), json!(range.to));
        payload.insert("isRealTime".into(), json!(false));
        payload
    }
}

/// Run a trend query.
///
/// # Errors
/// - [`QueryError::InvalidTrend`] if the query text is malformed (nothing is sent)
/// - [`QueryError::Remote`] if the agent reports an error for the parameter
/// - transport failures otherwise
pub async fn run<H>(client: &ApiClient<H>, query: &Query, range: TimeRange) -> Result<Frame, QueryError>
where
    H: HttpTransport + 'static,
{
    let target: TrendTarget = query.text().parse()?;
    tracing::debug!(ref_id = %query.ref_id, ?target, "trend query");

    let data: TrendData = client
        .call(ApiSurface::Json, GET_TREND_DATA, Some(target.payload(range)))
        .await?;
    if let Some(error) = data.error_message() {
        return Err(QueryError::Remote(error.to_string()));
    }

    Ok(assembler::trend_frame(&query.ref_id, &data)?)
}
