//! Tests for the connect client

use super::*;
use crate::auth::AuthConfig;
use crate::config::ClientConfig;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;
use sha2::{Digest, Sha256};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ConnectClient {
    let config = ClientConfig::builder()
        .connect_url(format!("{}/v2/", server.uri()))
        .build();
    ConnectClient::new(AuthConfig::Token("tok".to_string()), config).unwrap()
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

// ============================================================================
// Params
// ============================================================================

#[test]
fn test_search_params_wire_names() {
    let params = SearchParams::new()
        .fields(["entity", "risk"])
        .limit(5)
        .offset(10)
        .risk_score("[25,50)")
        .list_id("large")
        .order_by("riskscore", Direction::Desc)
        .param("custom", "x");
    let params = SearchParams {
        first_seen: Some("-1d".to_string()),
        ip_range: Some("10.0.0.0/8".to_string()),
        ..params
    }
    .to_params()
    .unwrap();

    assert_eq!(params["fields"], "entity,risk");
    assert_eq!(params["limit"], "5");
    assert_eq!(params["from"], "10");
    assert_eq!(params["riskScore"], "[25,50)");
    assert_eq!(params["firstSeen"], "-1d");
    assert_eq!(params["list"], "large");
    assert_eq!(params["orderby"], "riskscore");
    assert_eq!(params["direction"], "desc");
    assert_eq!(params["range"], "10.0.0.0/8");
    assert_eq!(params["custom"], "x");
    assert!(!params.contains_key("metadata"));
}

#[test]
fn test_search_params_risk_score_validation() {
    for ok in ["[25,50)", "(,60]", "[80,)"] {
        assert!(SearchParams::new().risk_score(ok).to_params().is_ok(), "{ok}");
    }
    for bad in ["25-50", "[,)", "[a,b]"] {
        let err = SearchParams::new().risk_score(bad).to_params().unwrap_err();
        assert!(matches!(err, Error::Config { .. }), "{bad}");
    }
}

#[test]
fn test_lookup_params() {
    let params = LookupParams::new()
        .fields(["risk"])
        .metadata(false)
        .to_params()
        .unwrap();
    assert_eq!(params["fields"], "risk");
    assert_eq!(params["metadata"], "false");
    assert!(LookupParams::new().to_params().unwrap().is_empty());
}

// ============================================================================
// Routes
// ============================================================================

#[tokio::test]
async fn test_lookup_sends_token_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/ip/8.8.8.8"))
        .and(header("X-RFToken", "tok"))
        .and(query_param("fields", "risk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"risk": {"score": 5}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let body = client
        .lookup_ip("8.8.8.8", &LookupParams::new().fields(["risk"]))
        .await
        .unwrap();
    assert_eq!(body["data"]["risk"]["score"], 5);
}

#[tokio::test]
async fn test_lookup_url_is_one_encoded_segment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/url/https:%2F%2Fexample.com%2Fa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .lookup_url("https://example.com/a", &LookupParams::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_search_hashes_uppercases_algorithm() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/hash/search"))
        .and(query_param("algorithm", "SHA256"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"results": [{"entity": {"id": "hash:abc"}}]},
            "counts": {"returned": 1, "total": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .search_hashes(Some("sha256"), SearchParams::new().limit(3))
        .await
        .unwrap();
    assert_eq!(response.entities()[0]["id"], "hash:abc");
}

#[tokio::test]
async fn test_extension_info() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/ip/1.2.3.4/extension/shodan"))
        .and(query_param("metadata", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ports": [22]}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/ip/5.6.7.8/extension/shodan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": null})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let data = client
        .get_extension_info("ip", "1.2.3.4", "shodan", Some(false))
        .await
        .unwrap();
    assert_eq!(data, Some(json!({"ports": [22]})));

    let none = client
        .get_extension_info("ip", "5.6.7.8", "shodan", None)
        .await
        .unwrap();
    assert_eq!(none, None);
}

#[tokio::test]
async fn test_riskrules_lift_entity_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/domain/riskrules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"results": [
                {"name": "recentPhishing", "entity": {"id": "rule:1"}},
                {"name": "noEntity"}
            ]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let rules = client.get_riskrules("domain").await.unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0]["id"], "rule:1");
    assert_eq!(rules[0]["name"], "recentPhishing");
    assert!(rules[1].get("id").is_none());
}

#[tokio::test]
async fn test_alert_rule_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/alert/rule"))
        .and(query_param("freetext", "leaked"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"results": [{"id": "r1", "title": "Leaked credentials"}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.get_alert_rule("leaked", 10).await.unwrap();
    assert_eq!(response.data().unwrap()["results"][0]["id"], "r1");
}

#[tokio::test]
async fn test_connect_errors_are_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/ip/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad range"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .search_ips(Some("nope"), SearchParams::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(matches!(err, Error::HttpError { .. }));
}

// ============================================================================
// Files
// ============================================================================

#[tokio::test]
async fn test_save_risklist() {
    let server = MockServer::start().await;
    let csv = "Name,Risk\n1.2.3.4,90\n5.6.7.8,75\n";

    Mock::given(method("GET"))
        .and(path("/v2/ip/risklist"))
        .and(query_param("format", DEFAULT_RISKLIST_FORMAT))
        .and(query_param("gzip", "false"))
        .and(query_param("list", "large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/csv")
                .set_body_string(csv),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut out = Vec::new();
    let written = client
        .save_risklist(&mut out, "ip", Some("large"), DEFAULT_RISKLIST_FORMAT, false)
        .await
        .unwrap();
    assert_eq!(written, csv.len() as u64);
    assert_eq!(String::from_utf8(out).unwrap(), csv);

    let response = client
        .get_risklist("ip", Some("large"), DEFAULT_RISKLIST_FORMAT, false)
        .await
        .unwrap()
        .into_response()
        .await
        .unwrap();
    let mut reader = response.csv_reader().unwrap();
    let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][0], "5.6.7.8");
}

#[tokio::test]
async fn test_save_demoevents_to_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/domain/demoevents"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("evt1\nevt2\n"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("demo.txt");
    let mut file = tokio::fs::File::create(&target).await.unwrap();

    let client = client_for(&server);
    client
        .save_demoevents(&mut file, "domain", 2)
        .await
        .unwrap();
    drop(file);

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "evt1\nevt2\n");
}

#[tokio::test]
async fn test_fusion_sync_skips_matching_checksum() {
    let server = MockServer::start().await;
    let content = b"a,b\n1,2\n";

    Mock::given(method("HEAD"))
        .and(path("/v2/fusion/files/"))
        .and(query_param("path", "/home/test.csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-RF-Content-SHA256", sha256_hex(content).to_uppercase()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("test.csv");
    std::fs::write(&local, content).unwrap();

    let client = client_for(&server);
    let synced = client
        .sync_fusion_file("/home/test.csv", &local, None, None)
        .await
        .unwrap();
    assert!(!synced);
}

#[tokio::test]
async fn test_fusion_sync_replaces_stale_file() {
    let server = MockServer::start().await;
    let remote = b"a,b\n3,4\n";

    Mock::given(method("HEAD"))
        .and(path("/v2/fusion/files/"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-RF-Content-SHA256", sha256_hex(remote)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/fusion/files/"))
        .and(query_param("path", "/home/test.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(remote.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let local = dir.path().join("test.csv");
    std::fs::write(&local, b"a,b\n1,2\n").unwrap();

    let client = client_for(&server);
    let synced = client
        .sync_fusion_file("/home/test.csv", &local, Some(tmp.path()), None)
        .await
        .unwrap();
    assert!(synced);
    assert_eq!(std::fs::read(&local).unwrap(), remote);
}

#[tokio::test]
async fn test_fusion_sync_missing_local_file() {
    let server = MockServer::start().await;
    let remote = b"fresh";

    Mock::given(method("HEAD"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("X-RF-Content-SHA256", sha256_hex(remote)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(remote.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("new.csv");

    let client = client_for(&server);
    let synced = client
        .sync_fusion_file("/home/new.csv", &local, None, None)
        .await
        .unwrap();
    assert!(synced);
    assert_eq!(std::fs::read(&local).unwrap(), remote);
}

#[tokio::test]
async fn test_fusion_sync_uses_given_checksum() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-RF-Content-SHA256", "ABCDEF"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&server);
    let synced = client
        .sync_fusion_file("/home/x.csv", dir.path().join("x.csv"), None, Some("abcdef"))
        .await
        .unwrap();
    assert!(!synced);
}
