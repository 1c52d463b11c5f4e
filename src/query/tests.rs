//! Tests for the query module

use super::*;
use crate::error::Error;
use crate::types::QueryKind;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

#[test_case(json!({"instance": {}}), Some(QueryKind::Instance))]
#[test_case(json!({"reference": {}}), Some(QueryKind::Reference))]
#[test_case(json!({"source": {}}), Some(QueryKind::Source))]
#[test_case(json!({"cluster": {}}), Some(QueryKind::Cluster))]
#[test_case(json!({"entity": {}}), Some(QueryKind::Entity))]
#[test_case(json!({"status": {}}), Some(QueryKind::Status))]
#[test_case(json!({"foo": {}}), None)]
fn test_kind_detection(value: serde_json::Value, expected: Option<QueryKind>) {
    let query = Query::from_value(value).unwrap();
    assert_eq!(query.kind(), expected);
}

#[test]
fn test_kind_detection_order() {
    let query = Query::from_value(json!({"entity": {}, "reference": {}})).unwrap();
    assert_eq!(query.kind(), Some(QueryKind::Reference));
}

#[test]
fn test_from_value_rejects_non_object() {
    let err = Query::from_value(json!([1, 2])).unwrap_err();
    assert!(matches!(err, Error::InvalidQuery { .. }));
}

#[test]
fn test_output_defaults_to_json() {
    let query = Query::entity(json!({"type": "IpAddress"}));
    let output = query.output();
    assert_eq!(output.format_name(), "json");
    assert!(output.expects_json());
    assert!(!query.is_aggregate());
}

#[test]
fn test_output_section() {
    let query = Query::reference(json!({}))
        .with_output(Output::format("csv/splunk"));
    assert_eq!(query.output().format_name(), "csv/splunk");
    assert!(!query.output().expects_json());
    assert_eq!(query.to_value()["output"], json!({"format": "csv/splunk"}));
}

#[test]
fn test_aggregate_detection() {
    let query = Query::from_value(json!({
        "reference": {},
        "output": {"count": {"axis": ["document.sourceId"]}}
    }))
    .unwrap();
    assert!(query.is_aggregate());
}

#[test]
fn test_set_and_remove_in_kind_body() {
    let mut query = Query::reference(json!({"type": "CyberAttack"}));
    query.set("page_start", "abc").unwrap();
    query.set("limit", 10).unwrap();

    assert_eq!(query.page_start(), Some("abc"));
    assert_eq!(query.embedded_limit(), Some(&json!(10)));
    assert_eq!(query.remove("limit"), Some(json!(10)));
    assert_eq!(query.embedded_limit(), None);
}

#[test]
fn test_set_without_kind_fails() {
    let mut query = Query::from_value(json!({"foo": {}})).unwrap();
    assert!(query.set("limit", 1).is_err());
}

#[test]
fn test_scan_detection() {
    let query = Query::reference(json!({"searchtype": "scan"}));
    assert!(query.is_scan());
    assert!(!Query::reference(json!({})).is_scan());
}

#[test]
fn test_status_query_shape() {
    assert_eq!(Query::status().to_value(), json!({"status": {}}));
    assert_eq!(Query::metadata().kind(), Some(QueryKind::Metadata));
}

#[test]
fn test_entity_from_details() {
    let entity = Entity::from_details(
        "B_LZ4",
        json!({"name": "Barack Obama", "type": "Person", "attributes": {"gender": "male"}}),
    )
    .unwrap();
    assert_eq!(entity.id, "B_LZ4");
    assert_eq!(entity.name.as_deref(), Some("Barack Obama"));
    assert_eq!(entity.entity_type.as_deref(), Some("Person"));
    assert_eq!(entity.attribute("gender"), Some(&json!("male")));

    assert!(Entity::from_details("x", json!("not an object")).is_none());
}

#[test]
fn test_reference_and_event_deserialize() {
    let reference: Reference = serde_json::from_value(json!({
        "id": "r1",
        "type": "Mention",
        "fragment": "text",
        "document": {"title": "doc"},
        "attributes": {"entities": ["e1"]},
        "score": 0.5
    }))
    .unwrap();
    assert_eq!(reference.reference_type.as_deref(), Some("Mention"));
    assert_eq!(reference.attributes["entities"], json!(["e1"]));
    assert_eq!(reference.extra["score"], json!(0.5));

    let event: Event = serde_json::from_value(json!({"type": "CyberAttack", "start": "2026-01-01"}))
        .unwrap();
    assert_eq!(event.event_type.as_deref(), Some("CyberAttack"));
    assert_eq!(event.start.as_deref(), Some("2026-01-01"));
}
