//! Integration tests for AU metadata submission and deletion.

mod common;

use axum::http::StatusCode;
use common::{CURATOR, READER, TestServer, basic_auth, item_json};
use serde_json::json;

#[tokio::test]
async fn test_post_assigns_increasing_ids() {
    let server = TestServer::new().await;

    let first = server.post_item(item_json("X", 1), CURATOR).await;
    let second = server.post_item(item_json("X", 2), CURATOR).await;
    let other = server.post_item(item_json("Y", 1), CURATOR).await;

    assert!(first < second);
    assert!(second < other);
}

#[tokio::test]
async fn test_post_keeps_generation_within_extraction() {
    let server = TestServer::new().await;

    server.post_item(item_json("X", 1), CURATOR).await;
    let generation = server.metadata().current_generation("X").await.unwrap();
    server.post_item(item_json("X", 2), CURATOR).await;

    assert!(generation.is_some());
    assert_eq!(server.metadata().current_generation("X").await.unwrap(), generation);
}

#[tokio::test]
async fn test_post_without_au_is_bad_request() {
    let server = TestServer::new().await;

    for body in [
        json!({ "scalarMap": { "article_title": "no AU" } }),
        json!({ "scalarMap": { "au_id": "   " } }),
        json!({}),
    ] {
        let (status, response) = server
            .json_request("POST", "/metadata/aus", Some(body.clone()), Some(CURATOR))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert_eq!(response["code"], "bad_request");
    }
}

#[tokio::test]
async fn test_post_with_client_id_is_bad_request() {
    let server = TestServer::new().await;

    let mut body = item_json("X", 1);
    body["id"] = json!(42);
    let (status, _) = server
        .json_request("POST", "/metadata/aus", Some(body), Some(CURATOR))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_post_invalid_json_is_bad_request() {
    let server = TestServer::new().await;

    let response = server
        .raw_request(
            "POST",
            "/metadata/aus",
            Some(b"{not json".to_vec()),
            Some(&basic_auth(CURATOR)),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_post_oversized_body_is_rejected() {
    let server = TestServer::with_config(|c| c.server.max_body_size = 64).await;

    let mut body = item_json("X", 1);
    body["scalarMap"]["abstract"] = json!("x".repeat(1024));
    let (status, _) = server
        .json_request("POST", "/metadata/aus", Some(body), Some(CURATOR))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_returns_count_then_not_found() {
    let server = TestServer::new().await;
    for n in 0..3 {
        server.post_item(item_json("X", n), CURATOR).await;
    }
    server.post_item(item_json("Y", 0), CURATOR).await;

    let (status, body) = server
        .json_request("DELETE", "/metadata/aus/X", None, Some(CURATOR))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(3));

    let (status, _) = server
        .json_request("GET", "/metadata/aus/X", None, Some(READER))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server
        .json_request("DELETE", "/metadata/aus/X", None, Some(CURATOR))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Other AUs are untouched.
    let (status, body) = server
        .json_request("GET", "/metadata/aus/Y", None, Some(READER))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_unknown_au_is_not_found() {
    let server = TestServer::new().await;
    let (status, body) = server
        .json_request("DELETE", "/metadata/aus/never-seen", None, Some(CURATOR))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_reinsert_after_delete_starts_new_generation() {
    let server = TestServer::sqlite().await;
    server.post_item(item_json("X", 1), CURATOR).await;
    let before = server.metadata().current_generation("X").await.unwrap().unwrap();

    server
        .json_request("DELETE", "/metadata/aus/X", None, Some(CURATOR))
        .await;
    server.post_item(item_json("X", 2), CURATOR).await;
    let after = server.metadata().current_generation("X").await.unwrap().unwrap();

    assert!(after > before);
}

#[tokio::test]
async fn test_au_ids_with_reserved_characters() {
    let server = TestServer::new().await;
    let au_id = "org|lockss|plugin|Foo&base_url~http%3A%2F%2Fexample%2Eorg%2F";
    server.post_item(item_json(au_id, 1), CURATOR).await;

    let encoded = au_id
        .replace('%', "%25")
        .replace('|', "%7C")
        .replace('&', "%26")
        .replace('~', "%7E");
    let (status, body) = server
        .json_request("GET", &format!("/metadata/aus/{encoded}"), None, Some(READER))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["scalarMap"]["au_id"], au_id);
}
