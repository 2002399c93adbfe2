//! Configured user initialization.

use anyhow::{Context, Result};
use aumeta_core::PasswordDigest;
use aumeta_core::config::AuthConfig;
use aumeta_core::role::parse_roles;
use aumeta_metadata::MetadataStore;
use aumeta_metadata::models::UserRow;
use time::OffsetDateTime;

/// Upsert every configured user into the credential store.
///
/// Existing users keep their creation time; digest and roles are replaced by
/// the configured values. Running this again with the same configuration
/// changes nothing but `updated_at`. Returns the number of users written.
pub async fn ensure_configured_users(
    metadata: &dyn MetadataStore,
    config: &AuthConfig,
) -> Result<usize> {
    if config.required && config.users.is_empty() {
        tracing::warn!("Authentication is required but no users are configured");
    }

    for user in &config.users {
        let roles = parse_roles(&user.roles)
            .with_context(|| format!("invalid roles for user {}", user.username))?;
        let digest = PasswordDigest::parse(&user.password_hash)
            .with_context(|| format!("invalid password_hash for user {}", user.username))?;

        let mut role_names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
        role_names.sort_unstable();

        let now = OffsetDateTime::now_utc();
        let existing = metadata.get_user(&user.username).await?;
        let row = UserRow {
            username: user.username.clone(),
            password_hash: digest.to_string(),
            roles: serde_json::to_string(&role_names)?,
            created_at: existing.as_ref().map_or(now, |row| row.created_at),
            updated_at: now,
        };

        metadata.upsert_user(&row).await?;
        if existing.is_some() {
            tracing::debug!(username = %user.username, roles = ?role_names, "User updated");
        } else {
            tracing::info!(username = %user.username, roles = ?role_names, "User created");
        }
    }

    Ok(config.users.len())
}
