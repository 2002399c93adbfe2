//! Configuration types shared across crates.

use crate::credential::PasswordDigest;
use crate::role::parse_roles;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Absolute prefix for pagination links (e.g., "https://md.example.org").
    /// When unset, links are relative to the server root.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Page size used when a request omits `limit`.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    /// The endpoint bypasses authentication; restrict it at the network level.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
    /// Upper bound in seconds on every call to the metadata store, the
    /// credential store, and the URL resolver.
    #[serde(default = "default_collaborator_timeout_secs")]
    pub collaborator_timeout_secs: u64,
    /// Maximum request body size in bytes for item submissions.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_page_size() -> u32 {
    crate::DEFAULT_PAGE_SIZE
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_collaborator_timeout_secs() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_base_url: None,
            default_page_size: default_page_size(),
            metrics_enabled: default_metrics_enabled(),
            collaborator_timeout_secs: default_collaborator_timeout_secs(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl ServerConfig {
    /// Get the collaborator timeout as a Duration.
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborator_timeout_secs)
    }
}

/// A user seeded into the credential store at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    /// `sha256:<hex>` or an Argon2 PHC string. Never the plaintext password.
    pub password_hash: String,
    /// Granted roles (e.g., ["user", "contentAdmin"]).
    #[serde(default = "default_user_roles")]
    pub roles: Vec<String>,
}

fn default_user_roles() -> Vec<String> {
    vec!["user".to_string()]
}

/// Authentication configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Require credentials on every non-public route (default: true).
    /// When false, every request proceeds as an anonymous principal.
    #[serde(default = "default_auth_required")]
    pub required: bool,
    /// Users to create or update at startup.
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

fn default_auth_required() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            required: default_auth_required(),
            users: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// Validate user entries: non-empty unique usernames, known roles, and
    /// parseable digests.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for user in &self.users {
            if user.username.is_empty() || user.username.contains(':') {
                return Err(format!(
                    "invalid username {:?}: must be non-empty and must not contain ':'",
                    user.username
                ));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(format!("duplicate user: {}", user.username));
            }
            parse_roles(&user.roles).map_err(|e| format!("user {}: {e}", user.username))?;
            PasswordDigest::parse(&user.password_hash)
                .map_err(|e| format!("user {}: {e}", user.username))?;
        }
        Ok(())
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database file.
    Sqlite {
        /// Database file path.
        path: PathBuf,
        /// How long a connection waits on a locked database, in seconds.
        #[serde(default = "default_busy_timeout_secs")]
        busy_timeout_secs: u64,
    },
    /// Process-local store. Contents are lost on restart.
    Memory,
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/metadata.db"),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

/// OpenURL resolver configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// When false, resolution yields no URLs.
    #[serde(default = "default_resolver_enabled")]
    pub enabled: bool,
}

fn default_resolver_enabled() -> bool {
    true
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            enabled: default_resolver_enabled(),
        }
    }
}

/// Full application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// OpenURL resolver configuration.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl AppConfig {
    /// Create a test configuration with an in-memory store.
    ///
    /// **For testing only.** Authentication is required and no users exist.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            metadata: MetadataConfig::Memory,
            resolver: ResolverConfig::default(),
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.default_page_size == 0 {
            return Err("server.default_page_size must be greater than 0".to_string());
        }
        if self.server.collaborator_timeout_secs == 0 {
            return Err("server.collaborator_timeout_secs must be greater than 0".to_string());
        }
        if let Some(base) = &self.server.public_base_url
            && !(base.starts_with("http://") || base.starts_with("https://"))
        {
            return Err(format!(
                "server.public_base_url must be an absolute http(s) URL, got {base:?}"
            ));
        }
        self.auth.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, roles: &[&str]) -> UserConfig {
        UserConfig {
            username: name.to_string(),
            password_hash: PasswordDigest::sha256_of("pw").to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.default_page_size, 50);
        assert!(config.server.metrics_enabled);
        assert!(config.auth.required);
        assert!(config.resolver.enabled);
        assert!(matches!(config.metadata, MetadataConfig::Sqlite { .. }));
        assert_eq!(config.server.collaborator_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_deserialize_sparse_json() {
        let json = r#"{"auth": {"required": false}, "metadata": {"type": "memory"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert!(!config.auth.required);
        assert!(matches!(config.metadata, MetadataConfig::Memory));
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_user_roles_default_to_user() {
        let json = r#"{"username": "alice", "password_hash": "sha256:00"}"#;
        let user: UserConfig = serde_json::from_str(json).unwrap();
        assert_eq!(user.roles, vec!["user"]);
    }

    #[test]
    fn test_validate_accepts_well_formed_users() {
        let mut config = AppConfig::for_testing();
        config.auth.users = vec![user("alice", &["user"]), user("bob", &["contentAdmin"])];
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_users() {
        let mut config = AppConfig::for_testing();
        config.auth.users = vec![user("alice", &["root"])];
        assert!(config.validate().unwrap_err().contains("unknown role"));

        config.auth.users = vec![user("alice", &["user"]), user("alice", &["user"])];
        assert!(config.validate().unwrap_err().contains("duplicate user"));

        config.auth.users = vec![user("a:b", &["user"])];
        assert!(config.validate().is_err());

        let mut bad_hash = user("carol", &["user"]);
        bad_hash.password_hash = "hunter2".to_string();
        config.auth.users = vec![bad_hash];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_server_bounds() {
        let mut config = AppConfig::for_testing();
        config.server.default_page_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::for_testing();
        config.server.public_base_url = Some("md.example.org".to_string());
        assert!(config.validate().is_err());

        config.server.public_base_url = Some("https://md.example.org".to_string());
        config.validate().unwrap();
    }
}
