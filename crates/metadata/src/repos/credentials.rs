//! Credential repository.

use crate::error::MetadataResult;
use crate::models::UserRow;
use async_trait::async_trait;

/// Repository for user credentials.
#[async_trait]
pub trait CredentialRepo: Send + Sync {
    /// Get a user by name.
    async fn get_user(&self, username: &str) -> MetadataResult<Option<UserRow>>;

    /// Create a user or replace its digest and roles.
    async fn upsert_user(&self, user: &UserRow) -> MetadataResult<()>;
}
