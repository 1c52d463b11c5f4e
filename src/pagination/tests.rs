//! Tests for pagination module

use super::*;
use crate::auth::AuthConfig;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::query::{Output, Query};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let config = ClientConfig::builder()
        .api_url(format!("{}/query/", server.uri()))
        .build();
    ApiClient::new(AuthConfig::Token("tok".to_string()), config).unwrap()
}

fn csv_page(start: usize, rows: usize) -> String {
    let mut body = String::from("Name,Risk\n");
    for i in start..start + rows {
        body.push_str(&format!("10.0.0.{i},{}\n", i % 100));
    }
    body
}

fn csv_response(start: usize, cursor: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("X-RF-NEXT-PAGE-START", cursor)
        .insert_header("X-RF-TOTAL-COUNT", "100")
        .insert_header("X-RF-RETURNED-COUNT", "10")
        .set_body_raw(csv_page(start, 10), "text/csv")
}

// ============================================================================
// PageOptions Tests
// ============================================================================

#[test]
fn test_page_options_defaults() {
    let options = PageOptions::default();
    assert_eq!(options.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(options.limit, None);
    assert!(!options.unique);
    assert!(!options.raw);
    assert_eq!(options.page_limit(), 1000);
}

#[test]
fn test_page_limit_is_min_of_batch_and_limit() {
    assert_eq!(PageOptions::new().batch_size(10).limit(25).page_limit(), 10);
    assert_eq!(PageOptions::new().batch_size(100).limit(25).page_limit(), 25);
}

#[test]
fn test_dedup_keys() {
    assert_eq!(
        PagedItem::Value(json!({"a": 1})).dedup_key(),
        PagedItem::Value(json!({"a": 1})).dedup_key()
    );
    assert_ne!(
        PagedItem::Value(json!(1)).dedup_key(),
        PagedItem::Value(json!("1")).dedup_key()
    );
    assert!(PagedItem::CsvHeader(vec![]).dedup_key().is_none());
}

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn test_unknown_kind_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = Query::from_value(json!({"foo": {}})).unwrap();
    let err = client.paged_query(&query, PageOptions::new()).unwrap_err();
    match err {
        Error::InvalidQuery { message, query } => {
            assert!(message.contains("Unknown query type None"));
            assert_eq!(query, json!({"foo": {}}));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_aggregate_query_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = Query::from_value(json!({
        "reference": {"type": "CyberAttack"},
        "output": {"count": {"axis": ["attributes.entities"]}}
    }))
    .unwrap();
    let err = client.paged_query(&query, PageOptions::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidQuery { .. }));
}

#[tokio::test]
async fn test_status_query_not_pageable() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let err = client
        .paged_query(&Query::status(), PageOptions::new())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidQuery { .. }));
}

#[tokio::test]
async fn test_embedded_limit_is_replaced() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let query = Query::reference(json!({"type": "CyberAttack", "limit": 5}));

    let pager = client
        .paged_query(&query, PageOptions::new().batch_size(50))
        .unwrap();
    assert_eq!(pager.query().embedded_limit(), Some(&json!(50)));
    // The caller's copy keeps its own limit
    assert_eq!(query.embedded_limit(), Some(&json!(5)));
}

// ============================================================================
// Paging Tests
// ============================================================================

#[tokio::test]
async fn test_csv_paging_header_once_then_limit_rows() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"reference": {"page_start": "c1", "limit": 10}})))
        .respond_with(csv_response(10, "c2"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"reference": {"page_start": "c2", "limit": 10}})))
        .respond_with(csv_response(20, "c3"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"reference": {"limit": 10}})))
        .respond_with(csv_response(0, "c1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = Query::reference(json!({})).with_output(Output::format("csv"));
    let items = client
        .paged_query(&query, PageOptions::new().batch_size(10).limit(25))
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(items.len(), 26);
    match &items[0] {
        PagedItem::CsvHeader(header) => assert_eq!(header, &vec!["Name", "Risk"]),
        other => panic!("expected header, got {other:?}"),
    }
    assert!(items[1..]
        .iter()
        .all(|item| matches!(item, PagedItem::CsvRow(_))));
    match &items[25] {
        PagedItem::CsvRow(row) => assert_eq!(row["Name"], "10.0.0.24"),
        other => panic!("expected row, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unique_across_pages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"instance": {"page_start": "c1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "instances": [{"id": "b"}, {"id": "c"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "instances": [{"id": "a"}, {"id": "b"}],
            "next_page_start": "c1"
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = PageOptions::new().field("instances").unique(true);
    let items = client
        .paged_query(&Query::instance(json!({})), options)
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    let ids: Vec<Value> = items
        .into_iter()
        .map(|item| item.into_value().unwrap()["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("a"), json!("b"), json!("c")]);
}

#[tokio::test]
async fn test_stops_when_total_reached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{"id": 1}, {"id": 2}],
            "next_page_start": "more",
            "counts": {"returned": 2, "total": 2}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let items = client
        .paged_query(&Query::cluster(json!({})), PageOptions::new().field("events"))
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_whole_pages_without_field() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"source": {"page_start": "p2"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sources": [3],
            "counts": {"returned": 1, "total": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sources": [1, 2],
            "next_page_start": "p2",
            "counts": {"returned": 2, "total": 3}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut pager = client
        .paged_query(&Query::source(json!({})), PageOptions::new())
        .unwrap();

    let first = pager.next().await.unwrap().unwrap();
    assert_eq!(first.as_value().unwrap()["sources"], json!([1, 2]));
    let second = pager.next().await.unwrap().unwrap();
    assert_eq!(second.as_value().unwrap()["sources"], json!([3]));
    assert!(pager.next().await.is_none());
    assert_eq!(pager.state().pages, 2);
}

#[tokio::test]
async fn test_other_content_type_yields_response_and_stops() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .insert_header("X-RF-NEXT-PAGE-START", "never-used")
                .set_body_string("<stix/>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = Query::reference(json!({})).with_output(Output::format("xml/stix/1.2"));
    let items = client
        .paged_query(&query, PageOptions::new())
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    match &items[0] {
        PagedItem::Response(resp) => assert_eq!(resp.text(), Some("<stix/>")),
        other => panic!("expected response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_csv_degrades_to_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/csv")
                .set_body_string("a,b\n1,2,3\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let query = Query::reference(json!({})).with_output(Output::format("csv"));
    let items = client
        .paged_query(&query, PageOptions::new())
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], PagedItem::Response(_)));
}

#[tokio::test]
async fn test_raw_mode_counts_returned() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-RF-RETURNED-COUNT", "5")
                .insert_header("X-RF-NEXT-PAGE-START", "next")
                .set_body_json(json!({"instances": []})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let items = client
        .paged_query(
            &Query::instance(json!({})),
            PageOptions::new().raw(true).limit(10).batch_size(5),
        )
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| matches!(i, PagedItem::Response(_))));
}

#[tokio::test]
async fn test_error_ends_paging() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("nope"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut pager = client
        .paged_query(&Query::reference(json!({})), PageOptions::new())
        .unwrap();

    assert!(pager.next().await.unwrap().is_err());
    assert!(pager.next().await.is_none());
}

#[tokio::test]
async fn test_zero_limit_makes_no_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut pager = client
        .paged_query(&Query::reference(json!({})), PageOptions::new().limit(0))
        .unwrap();
    assert!(pager.next().await.is_none());
}

#[tokio::test]
async fn test_into_stream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity_details": {"X": {"name": "x"}, "Y": {"name": "y"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stream = client
        .paged_query(
            &Query::entity(json!({})),
            PageOptions::new().field("entity_details"),
        )
        .unwrap()
        .into_stream();

    let keys: Vec<String> = stream
        .map(|item| match item.unwrap() {
            PagedItem::Entry(key, _) => key,
            other => panic!("expected entry, got {other:?}"),
        })
        .collect()
        .await;
    assert_eq!(keys, vec!["X", "Y"]);
}
