//! Integration tests for DOI and OpenURL resolution.

mod common;

use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use common::{CURATOR, READER, TestServer, basic_auth, item_json};
use serde_json::{Value, json};

fn article(au_id: &str, n: usize, fields: &[(&str, &str)]) -> Value {
    let mut item = item_json(au_id, n);
    for (key, value) in fields {
        item["scalarMap"][*key] = json!(value);
    }
    item
}

async fn resolve(server: &TestServer, uri: &str) -> (StatusCode, Value) {
    server.json_request("GET", uri, None, Some(READER)).await
}

#[tokio::test]
async fn test_doi_resolves_access_url() {
    let server = TestServer::new().await;
    server
        .post_item(
            article("X", 1, &[("doi", "10.1000/ABC"), ("access_url", "http://pub.example/abc")]),
            CURATOR,
        )
        .await;

    let (status, body) = resolve(&server, "/urls/doi?doi=10.1000/abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["params"], json!({ "rft_id": "info:doi/10.1000/abc" }));
    assert_eq!(body["urls"], json!(["http://pub.example/abc"]));
}

#[tokio::test]
async fn test_unknown_doi_is_empty_not_error() {
    let server = TestServer::new().await;

    let (status, body) = resolve(&server, "/urls/doi?doi=10.9999/nothing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["params"]["rft_id"], "info:doi/10.9999/nothing");
    assert_eq!(body["urls"], json!([]));
}

#[tokio::test]
async fn test_missing_doi_is_bad_request() {
    let server = TestServer::new().await;

    for uri in ["/urls/doi", "/urls/doi?doi=", "/urls/doi?doi=%20%20"] {
        let (status, body) = resolve(&server, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
        assert_eq!(body["code"], "bad_request");
    }
}

async fn assert_dedup_scenario(server: &TestServer) {
    let issn = ("issn", "1234-5678");
    server
        .post_item(article("X", 1, &[issn, ("access_url", "http://a")]), CURATOR)
        .await;
    server
        .post_item(article("X", 2, &[issn, ("access_url", "http://a")]), CURATOR)
        .await;
    server.post_item(article("X", 3, &[issn]), CURATOR).await;
    server
        .post_item(article("Y", 4, &[("eissn", "1234-5678"), ("access_url", "http://b")]), CURATOR)
        .await;

    let (status, body) = resolve(server, "/urls/openurl?params=rft.issn%3D1234-5678").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["params"], json!({ "rft.issn": "1234-5678" }));
    assert_eq!(body["urls"], json!(["http://a", "http://b"]));
}

#[tokio::test]
async fn test_openurl_dedups_and_drops_null_memory() {
    let server = TestServer::new().await;
    assert_dedup_scenario(&server).await;
}

#[tokio::test]
async fn test_openurl_dedups_and_drops_null_sqlite() {
    let server = TestServer::sqlite().await;
    assert_dedup_scenario(&server).await;
}

#[tokio::test]
async fn test_openurl_citation_match() {
    let server = TestServer::new().await;
    server
        .post_item(
            article(
                "X",
                1,
                &[("issn", "1111-2222"), ("volume", "7"), ("access_url", "http://vol7")],
            ),
            CURATOR,
        )
        .await;
    server
        .post_item(
            article(
                "X",
                2,
                &[("issn", "1111-2222"), ("volume", "8"), ("access_url", "http://vol8")],
            ),
            CURATOR,
        )
        .await;

    let (status, body) = resolve(
        &server,
        "/urls/openurl?params=rft.issn%3D1111-2222&params=rft.volume%3D8",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["urls"], json!(["http://vol8"]));
}

#[tokio::test]
async fn test_duplicate_doi_is_json_bad_request() {
    let server = TestServer::new().await;

    let response = server
        .raw_request(
            "GET",
            "/urls/doi?doi=10.1/a&doi=10.1/b",
            None,
            Some(&basic_auth(READER)),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    let body: Value = serde_json::from_slice(&response.body).expect("JSON error body");
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_openurl_without_params_is_bad_request() {
    let server = TestServer::new().await;

    for uri in ["/urls/openurl", "/urls/openurl?other=x"] {
        let (status, body) = resolve(&server, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
        assert_eq!(body["code"], "bad_request");
    }
}

#[tokio::test]
async fn test_openurl_drops_malformed_entries() {
    let server = TestServer::new().await;

    let (status, body) = resolve(
        &server,
        "/urls/openurl?params=garbage&params=%3Dx&params=rft.volume%3D4&params=rft.spage%3D",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["params"], json!({ "rft.volume": "4" }));
    assert_eq!(body["urls"], json!([]));

    // Only malformed entries: accepted, nothing to resolve.
    let (status, body) = resolve(&server, "/urls/openurl?params=garbage").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["params"], json!({}));
    assert_eq!(body["urls"], json!([]));
}

#[tokio::test]
async fn test_openurl_duplicate_keys_last_wins() {
    let server = TestServer::new().await;

    let (status, body) = resolve(
        &server,
        "/urls/openurl?params=rft.volume%3D4&params=rft.volume%3D5",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["params"], json!({ "rft.volume": "5" }));
}

#[tokio::test]
async fn test_resolver_disabled_returns_no_urls() {
    let server = TestServer::with_config(|c| c.resolver.enabled = false).await;
    server
        .post_item(article("X", 1, &[("doi", "10.1/a"), ("access_url", "http://a")]), CURATOR)
        .await;

    let (status, body) = resolve(&server, "/urls/doi?doi=10.1/a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["params"]["rft_id"], "info:doi/10.1/a");
    assert_eq!(body["urls"], json!([]));
}

#[tokio::test]
async fn test_resolution_requires_credentials() {
    let server = TestServer::new().await;

    for uri in ["/urls/doi?doi=10.1/a", "/urls/openurl?params=rft.volume%3D1"] {
        let (status, body) = server.json_request("GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "uri {uri}");
        assert_eq!(body["code"], "unauthorized");
    }
}
