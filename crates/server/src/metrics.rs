//! Prometheus metrics for the aumeta server.
//!
//! The `/metrics` endpoint is unauthenticated so Prometheus can scrape it.
//! Metrics carry no AU ids, usernames, or URLs, only aggregate counts.
//! Restrict the endpoint at the network level when it must not be public.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{self, Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Access control
pub static AUTH_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aumeta_http_auth_failures_total",
            "Total rejected authentication attempts by reason",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

pub static AUTHZ_DENIALS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "aumeta_authz_denials_total",
        "Total authenticated requests denied for insufficient role",
    )
    .expect("metric creation failed")
});

// Pagination
pub static PAGES_SERVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "aumeta_metadata_pages_served_total",
        "Total AU metadata pages served",
    )
    .expect("metric creation failed")
});

pub static ITEMS_SERVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "aumeta_metadata_items_served_total",
        "Total AU metadata items returned across all pages",
    )
    .expect("metric creation failed")
});

pub static PAGINATION_CONFLICTS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "aumeta_pagination_conflicts_total",
        "Total page requests rejected because the AU was re-extracted",
    )
    .expect("metric creation failed")
});

// URL resolution
pub static URL_RESOLUTIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aumeta_url_resolutions_total",
            "Total URL resolution requests by kind (doi, openurl)",
        ),
        &["kind"],
    )
    .expect("metric creation failed")
});

// Collaborators
pub static COLLABORATOR_TIMEOUTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "aumeta_collaborator_timeouts_total",
            "Total collaborator calls abandoned after the configured timeout",
        ),
        &["collaborator"],
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so integration tests can build many routers in one process.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(AUTH_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(AUTHZ_DENIALS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PAGES_SERVED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ITEMS_SERVED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PAGINATION_CONFLICTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(URL_RESOLUTIONS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(COLLABORATOR_TIMEOUTS.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record a rejected authentication attempt.
pub fn record_auth_failure(reason: &str) {
    AUTH_FAILURES.with_label_values(&[reason]).inc();
}

/// Record a collaborator call that timed out.
pub fn record_collaborator_timeout(collaborator: &str) {
    COLLABORATOR_TIMEOUTS.with_label_values(&[collaborator]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        register_metrics();
        register_metrics();
    }

    #[tokio::test]
    async fn test_exposition_contains_counters() {
        register_metrics();
        record_auth_failure("missing_credentials");
        let response = metrics_handler().await.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("aumeta_http_auth_failures_total"));
    }
}
