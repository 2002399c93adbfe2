//! Service status endpoint.

use crate::handlers::common::{METADATA_STORE, with_timeout};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// True when the metadata store answers a health check.
    pub ready: bool,
    pub version: &'static str,
}

/// GET /status - Readiness check.
///
/// Public, and always 200: a failing store is reported as `ready: false`
/// rather than as an error.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let ready = match with_timeout(&state, METADATA_STORE, state.metadata.health_check()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Metadata store health check failed");
            false
        }
    };

    Json(StatusResponse {
        ready,
        version: env!("CARGO_PKG_VERSION"),
    })
}
