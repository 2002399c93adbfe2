//! Application state shared across handlers.

use aumeta_core::PasswordDigest;
use aumeta_core::config::AppConfig;
use aumeta_metadata::MetadataStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Item, credential, and resolution store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Verified against when a username is unknown. Costs as much as the
    /// configured digests.
    pub dummy_digest: Arc<PasswordDigest>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: AppConfig, metadata: Arc<dyn MetadataStore>) -> Self {
        if !config.auth.required {
            tracing::warn!(
                "Authentication is disabled; every request runs as an anonymous principal"
            );
        }
        if config.server.metrics_enabled {
            tracing::debug!("/metrics is enabled and unauthenticated");
        }

        let configured: Vec<PasswordDigest> = config
            .auth
            .users
            .iter()
            .filter_map(|user| PasswordDigest::parse(&user.password_hash).ok())
            .collect();
        let dummy_digest = PasswordDigest::dummy_matching(&configured);

        Self {
            config: Arc::new(config),
            metadata,
            dummy_digest: Arc::new(dummy_digest),
        }
    }
}
