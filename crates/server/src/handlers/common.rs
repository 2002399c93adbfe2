//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use aumeta_metadata::MetadataResult;
use std::future::Future;

/// Collaborator label for credential lookups.
pub const CREDENTIAL_STORE: &str = "credential_store";
/// Collaborator label for item reads and writes.
pub const METADATA_STORE: &str = "metadata_store";
/// Collaborator label for OpenURL resolution.
pub const URL_RESOLVER: &str = "url_resolver";

/// Run a collaborator call under the configured timeout.
///
/// An elapsed call becomes [`ApiError::Unavailable`] and is not retried.
pub async fn with_timeout<T, F>(
    state: &AppState,
    collaborator: &'static str,
    call: F,
) -> ApiResult<T>
where
    F: Future<Output = MetadataResult<T>>,
{
    let timeout = state.config.server.collaborator_timeout();
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            metrics::record_collaborator_timeout(collaborator);
            tracing::warn!(
                collaborator,
                timeout_secs = timeout.as_secs(),
                "Collaborator call timed out"
            );
            Err(ApiError::Unavailable(format!("{collaborator} timed out")))
        }
    }
}
