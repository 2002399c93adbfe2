//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Readiness check (public)
        .route("/status", get(handlers::get_status))
        // AU metadata
        .route("/metadata/aus", post(handlers::post_item))
        .route(
            "/metadata/aus/{auid}",
            get(handlers::get_au_metadata).delete(handlers::delete_au_metadata),
        )
        // URL resolution
        .route("/urls/doi", get(handlers::get_doi_urls))
        .route("/urls/openurl", get(handlers::get_openurl_urls));

    // The endpoint is public; see crate::metrics.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    // Order of execution: TraceLayer -> Auth -> Handler
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
