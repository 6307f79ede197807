use std::sync::Arc;

use dma_core::{
    Query, QueryHandler, QueryRequest, TimeRange,
    mock::{MockTransport, fault, reply},
};
use dma_query::{DataSource, QueryOptions};
use dma_transport::protocol::{
    CONNECT_APP, GET_NEXT_QUERY_SESSION_PAGE, GET_TREND_DATA, NO_CONNECTION_EXCEPTION,
    OPEN_QUERY_SESSION,
};
use serde_json::json;

fn agent() -> Arc<MockTransport> {
    Arc::new(MockTransport::new(|call| match call.method.as_str() {
        CONNECT_APP => reply(json!(format!("token-{}", call.attempt + 1))),
        GET_TREND_DATA => reply(json!({"Avg": [4], "Timestamps": [1000]})),
        OPEN_QUERY_SESSION => reply(json!({
            "ID": "s",
            "Columns": [{"Name": "Name", "ClientType": "string"}]
        })),
        GET_NEXT_QUERY_SESSION_PAGE => reply(json!({
            "Rows": [{"Cells": [{"Value": "dma"}]}],
            "IsLast": true
        })),
        _ => reply(json!(null)),
    }))
}

#[tokio::test]
async fn results_are_positional_and_independent() {
    let transport = agent();
    let source = DataSource::new(Arc::clone(&transport), "http://agent", QueryOptions::default());

    let response = source
        .query(QueryRequest {
            range: TimeRange::new(0, 10_000),
            timezone: "browser".into(),
            max_data_points: Some(0),
            targets: vec![
                Query::gqi("A", "{}"),
                Query::trend("B", "not/a/path"),
                Query::trend("C", "1/2/3"),
                Query::gqi("D", "[gf-starttime"),
            ],
        })
        .await;

    let ids: Vec<&str> = response.data.iter().map(|r| r.ref_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C", "D"]);

    assert_eq!(response.data[0].frame.as_ref().unwrap().len(), 1);
    assert_eq!(response.data[1].error.as_deref(), Some("Invalid trend request."));
    assert_eq!(response.data[2].frame.as_ref().unwrap().len(), 1);
    assert!(
        response.data[3]
            .error
            .as_deref()
            .unwrap()
            .starts_with("Invalid query: ")
    );

    assert_eq!(transport.count(CONNECT_APP), 1);
}

#[tokio::test]
async fn browser_timezone_resolves_to_a_name() {
    let transport = agent();
    let source = DataSource::new(
        Arc::clone(&transport),
        "http://agent",
        QueryOptions {
            timezone: Some("Europe/Brussels".into()),
            ..QueryOptions::default()
        },
    );

    source
        .query(QueryRequest {
            range: TimeRange::new(0, 1),
            timezone: "browser".into(),
            max_data_points: None,
            targets: vec![Query::gqi("A", "{}")],
        })
        .await;

    let open = &transport.calls_to(OPEN_QUERY_SESSION)[0];
    assert_eq!(open.arg("options").unwrap()["TimeZoneID"], "Europe/Brussels");
}

#[tokio::test]
async fn expired_session_is_recovered_mid_query() {
    let transport = Arc::new(MockTransport::new(|call| match (call.method.as_str(), call.attempt) {
        (CONNECT_APP, n) => reply(json!(format!("token-{}", n + 1))),
        (GET_TREND_DATA, 0) => fault(500, Some("Connection expired"), Some(NO_CONNECTION_EXCEPTION)),
        (GET_TREND_DATA, _) => reply(json!({"Avg": [1, 2], "Timestamps": [1, 2]})),
        _ => reply(json!(null)),
    }));
    let source = DataSource::new(Arc::clone(&transport), "http://agent", QueryOptions::default());

    let response = source
        .query(QueryRequest {
            range: TimeRange::new(0, 1),
            timezone: String::new(),
            max_data_points: None,
            targets: vec![Query::trend("A", "1/2/3")],
        })
        .await;

    assert_eq!(response.data[0].frame.as_ref().unwrap().len(), 2);
    let trend_calls = transport.calls_to(GET_TREND_DATA);
    assert_eq!(trend_calls.len(), 2);
    assert_eq!(trend_calls[1].arg("connection"), Some(&json!("token-2")));
}
