//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;

/// Archival Unit extraction record.
#[derive(Debug, Clone, FromRow)]
pub struct AuRow {
    pub au_id: String,
    /// Generation of the current (or most recent) extraction.
    pub generation: i64,
    /// False once the AU's metadata has been deleted.
    pub active: bool,
    pub extracted_at: OffsetDateTime,
}

/// Stored item. `body` is the JSON of the item without its id.
#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    pub item_id: i64,
    pub au_id: String,
    pub body: String,
}

/// Credential record.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub username: String,
    /// `sha256:<hex>` or an Argon2 PHC string.
    pub password_hash: String,
    /// JSON array of role names.
    pub roles: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
