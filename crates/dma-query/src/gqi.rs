//! GQI queries: paged tabular results over a server-side query session.

use std::future::Future;

use dma_core::{
    Frame, HttpTransport, Query, TimeRange,
    types::{GqiResultPage, GqiSessionInfo},
};
use dma_session::ApiClient;
use dma_transport::{
    ApiError, ApiSurface,
    protocol::{CLOSE_QUERY_SESSION, GET_NEXT_QUERY_SESSION_PAGE, OPEN_QUERY_SESSION},
};
use serde_json::{Map, Value, json};
use tokio::time::Instant;

use crate::{QueryError, QueryOptions, QueryScope, assembler, timezone};

/// Placeholder for the start of the requested range.
pub const START_TIME_PLACEHOLDER: &str = "[gf-starttime]";
/// Placeholder for the end of the requested range.
pub const END_TIME_PLACEHOLDER: &str = "[gf-endtime]";

/// Replace the range placeholders with the range bounds.
#[must_use]
pub fn substitute_placeholders(text: &str, range: TimeRange) -> String {
    text.replace(START_TIME_PLACEHOLDER, &range.from.to_string())
        .replace(END_TIME_PLACEHOLDER, &range.to.to_string())
}

/// Parse GQI query text. Empty text is an empty query.
///
/// # Errors
/// Returns [`QueryError::InvalidQuery`] if the text is not JSON.
pub fn parse_query(text: &str) -> Result<Value, QueryError> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(text).map_err(|e| QueryError::InvalidQuery(e.to_string()))
}

fn open_payload(query: Value, timezone: &str, dynamic_units: bool) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(
        "options".into(),
        json!({
            "EnableUpdates": false,
            "TimeZoneID": timezone,
            "UseDynamicUnits": dynamic_units,
        }),
    );
    payload.insert("query".into(), query);
    payload
}

fn session_payload(session_id: &str) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("sessionID".into(), json!(session_id));
    payload
}

/// Whether an `OpenQuerySession` reply means "no session".
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() < f64::EPSILON),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Run a GQI query.
///
/// Opens a query session, pages through it until the row limit is reached
/// or the agent reports the last page, and closes the session again whatever
/// the outcome.
///
/// # Errors
/// - [`QueryError::InvalidQuery`] if the query text is not JSON (nothing is sent)
/// - [`QueryError::Frame`] if a row does not match the column list
/// - [`QueryError::Timeout`] if the query exceeds the configured timeout
/// - transport failures otherwise
pub async fn run<H>(
    client: &ApiClient<H>,
    options: &QueryOptions,
    query: &Query,
    scope: &QueryScope<'_>,
) -> Result<Frame, QueryError>
where
    H: HttpTransport + 'static,
{
    let text = substitute_placeholders(query.text(), scope.range);
    let gqi_query = parse_query(&text)?;
    let tz = timezone::resolve(scope.timezone, options.timezone.as_deref());
    let deadline = Deadline::new(options);

    let opened: Value = deadline
        .run(client.call(
            ApiSurface::Internal,
            OPEN_QUERY_SESSION,
            Some(open_payload(gqi_query, &tz, query.dynamic_units())),
        ))
        .await?;
    if is_falsy(&opened) {
        tracing::debug!(ref_id = %query.ref_id, "agent opened no query session");
        return Ok(Frame::new(query.ref_id.as_str()));
    }
    let session: GqiSessionInfo =
        serde_json::from_value(opened).map_err(|e| ApiError::InvalidResponse {
            method: OPEN_QUERY_SESSION.to_string(),
            reason: e.to_string(),
        })?;

    let limit = options.point_limit(scope.max_data_points);
    let mut frame = assembler::gqi_frame(&query.ref_id, session.columns.as_deref().unwrap_or_default());
    let fetched = deadline
        .run(fetch_pages(client, &session, &mut frame, limit, options.page_size))
        .await;

    close_session(client, &session.id).await;

    fetched.map(|()| frame)
}

async fn fetch_pages<H>(
    client: &ApiClient<H>,
    session: &GqiSessionInfo,
    frame: &mut Frame,
    limit: usize,
    page_size: usize,
) -> Result<(), QueryError>
where
    H: HttpTransport + 'static,
{
    while frame.len() < limit {
        let mut payload = session_payload(&session.id);
        payload.insert("start".into(), json!(frame.len()));
        payload.insert("pageSize".into(), json!(page_size));

        let page: Option<GqiResultPage> = client
            .call(ApiSurface::Internal, GET_NEXT_QUERY_SESSION_PAGE, Some(payload))
            .await?;
        let Some(page) = page else {
            break;
        };

        let before = frame.len();
        assembler::append_page(frame, session.columns.as_deref(), &page)?;
        tracing::debug!(session = %session.id, rows = frame.len(), last = page.is_last(), "GQI page");

        if page.is_last() {
            break;
        }
        // The next request would ask for the same start again.
        if frame.len() == before {
            if !page.is_empty() {
                tracing::debug!(session = %session.id, "page added no rows, stopping");
            }
            break;
        }
    }
    Ok(())
}

async fn close_session<H>(client: &ApiClient<H>, session_id: &str)
where
    H: HttpTransport + 'static,
{
    if let Err(e) = client
        .call::<Value>(ApiSurface::Internal, CLOSE_QUERY_SESSION, Some(session_payload(session_id)))
        .await
    {
        tracing::debug!(session = session_id, "closing query session failed: {e}");
    }
}

/// Optional overall time limit shared by the steps of one query.
struct Deadline {
    at: Option<(Instant, u64)>,
}

impl Deadline {
    fn new(options: &QueryOptions) -> Self {
        Self {
            at: options
                .timeout()
                .map(|timeout| (Instant::now() + timeout, timeout.as_secs())),
        }
    }

    async fn run<T, E, F>(&self, step: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, E>>,
        QueryError: From<E>,
    {
        match self.at {
            Some((at, secs)) => tokio::time::timeout_at(at, step)
                .await
                .map_err(|_| QueryError::Timeout(secs))?
                .map_err(QueryError::from),
            None => step.await.map_err(QueryError::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        let text = r#"{"From": [gf-starttime], "To": [gf-endtime], "Again": [gf-starttime]}"#;
        let substituted =
            substitute_placeholders(text, TimeRange::new(1_700_000_000_000, 1_700_003_600_000));
        assert_eq!(
            substituted,
            r#"{"From": 1700000000000, "To": 1700003600000, "Again": 1700000000000}"#
        );
        assert_eq!(
            parse_query(&substituted).unwrap()["To"],
            json!(1_700_003_600_000_i64)
        );
    }

    #[test]
    fn test_empty_text_is_empty_query() {
        assert_eq!(parse_query("").unwrap(), json!({}));
        assert_eq!(parse_query("  ").unwrap(), json!({}));
    }

    #[test]
    fn test_invalid_text() {
        let err = parse_query("{not json").unwrap_err();
        assert!(err.to_string().starts_with("Invalid query: "));
    }

    #[test]
    fn test_falsy_sessions() {
        for value in [Value::Null, json!(false), json!(""), json!(0)] {
            assert!(is_falsy(&value), "{value}");
        }
        for value in [json!({"ID": "s"}), json!("s"), json!(true), json!([])] {
            assert!(!is_falsy(&value), "{value}");
        }
    }

    #[test]
    fn test_open_payload() {
        let payload = Value::Object(open_payload(json!({"ID": "Elements"}), "Europe/Brussels", true));
        assert_eq!(
            payload,
            json!({
                "options": {"EnableUpdates": false, "TimeZoneID": "Europe/Brussels", "UseDynamicUnits": true},
                "query": {"ID": "Elements"}
            })
        );
    }

    #[tokio::test]
    async fn test_deadline_expires() {
        let options = QueryOptions {
            timeout_secs: Some(0),
            ..QueryOptions::default()
        };
        let err = Deadline::new(&options)
            .run(std::future::pending::<Result<(), QueryError>>())
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::Timeout(0));
    }

    #[tokio::test]
    async fn test_no_deadline_passes_errors_through() {
        let result = Deadline::new(&QueryOptions::default())
            .run(async { Err::<(), _>(ApiError::RequestFailed) })
            .await;
        assert_eq!(result, Err(QueryError::Api(ApiError::RequestFailed)));
    }
}
