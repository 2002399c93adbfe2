//! Server test utilities.

use super::fixtures::{Credentials, basic_auth, test_users};
use aumeta_core::config::{AppConfig, MetadataConfig};
use aumeta_metadata::MetadataStore;
use aumeta_server::bootstrap::ensure_configured_users;
use aumeta_server::{AppState, create_router};
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: Option<TempDir>,
}

/// A response with its raw body.
#[allow(dead_code)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a memory-backed server with authentication on and the fixture
    /// users seeded.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a memory-backed server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = AppConfig::for_testing();
        config.auth.users = test_users();
        modifier(&mut config);
        Self::build(config, None).await
    }

    /// Create a server backed by a SQLite database in a temporary directory.
    pub async fn sqlite() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let mut config = AppConfig::for_testing();
        config.auth.users = test_users();
        config.metadata = MetadataConfig::Sqlite {
            path: temp_dir.path().join("metadata.db"),
            busy_timeout_secs: 5,
        };
        Self::build(config, Some(temp_dir)).await
    }

    /// Create a server around an existing store.
    pub async fn with_store(config: AppConfig, metadata: Arc<dyn MetadataStore>) -> Self {
        ensure_configured_users(metadata.as_ref(), &config.auth)
            .await
            .expect("Failed to seed users");
        aumeta_server::metrics::register_metrics();

        let state = AppState::new(config, metadata);
        let router = create_router(state.clone());
        Self {
            router,
            state,
            _temp_dir: None,
        }
    }

    async fn build(config: AppConfig, temp_dir: Option<TempDir>) -> Self {
        config.validate().expect("invalid test configuration");
        let metadata = aumeta_metadata::from_config(&config.metadata)
            .await
            .expect("Failed to create metadata store");
        let mut server = Self::with_store(config, metadata).await;
        server._temp_dir = temp_dir;
        server
    }

    /// Get access to the underlying metadata store.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Send a request with an optional raw `Authorization` header value.
    pub async fn raw_request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Vec<u8>>,
        authorization: Option<&str>,
    ) -> RawResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let body = match body {
            Some(bytes) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        RawResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a JSON request as `creds` (or anonymously) and parse the response.
    pub async fn json_request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        creds: Option<Credentials>,
    ) -> (StatusCode, Value) {
        let authorization = creds.map(basic_auth);
        let body = body.map(|v| serde_json::to_vec(&v).unwrap());
        let response = self
            .raw_request(method, uri, body, authorization.as_deref())
            .await;

        let json = if response.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&response.body).unwrap_or(Value::Null)
        };
        (response.status, json)
    }

    /// POST an item as `creds`, asserting success, and return its id.
    pub async fn post_item(&self, item: Value, creds: Credentials) -> i64 {
        let (status, body) = self
            .json_request("POST", "/metadata/aus", Some(item), Some(creds))
            .await;
        assert_eq!(status, StatusCode::OK, "post failed: {body}");
        body.as_i64().expect("item id")
    }
}
