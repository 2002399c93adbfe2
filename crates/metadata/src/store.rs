//! Metadata store trait and SQLite implementation.

use crate::error::MetadataResult;
use crate::models::{AuRow, ItemRow, UserRow};
use crate::repos::items::{next_generation, now_millis};
use crate::repos::resolver::unresolved;
use crate::repos::{CredentialRepo, ItemRepo, ResolutionCriteria, UrlResolver};
use async_trait::async_trait;
use aumeta_core::ItemMetadata;
use aumeta_core::item::keys;
use aumeta_core::openurl::OpenUrlParams;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: ItemRepo + CredentialRepo + UrlResolver + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (or create) a SQLite store and run migrations.
    pub async fn new(path: impl AsRef<Path>, busy_timeout_secs: u64) -> MetadataResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(busy_timeout_secs));

        let pool = SqlitePoolOptions::new()
            // Single connection: SQLite allows one writer at a time.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ItemRepo for SqliteStore {
    async fn current_generation(&self, au_id: &str) -> MetadataResult<Option<i64>> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT generation FROM aus WHERE au_id = ? AND active = 1")
                .bind(au_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(generation,)| generation))
    }

    async fn scan_items(
        &self,
        au_id: &str,
        after_id: Option<i64>,
        limit: u32,
    ) -> MetadataResult<Vec<ItemMetadata>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT item_id, au_id, body FROM items
            WHERE au_id = ? AND item_id > ?
            ORDER BY item_id ASC
            LIMIT ?
            "#,
        )
        .bind(au_id)
        .bind(after_id.unwrap_or(0))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let mut item: ItemMetadata = serde_json::from_str(&row.body)?;
                item.id = Some(row.item_id);
                Ok(item)
            })
            .collect()
    }

    async fn delete_au(&self, au_id: &str) -> MetadataResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let active: Option<(bool,)> = sqlx::query_as("SELECT active FROM aus WHERE au_id = ?")
            .bind(au_id)
            .fetch_optional(&mut *tx)
            .await?;
        if !matches!(active, Some((true,))) {
            return Ok(None);
        }

        let deleted = sqlx::query("DELETE FROM items WHERE au_id = ?")
            .bind(au_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("UPDATE aus SET active = 0 WHERE au_id = ?")
            .bind(au_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(deleted))
    }

    async fn insert_item(&self, item: &ItemMetadata) -> MetadataResult<i64> {
        let au_id = item.validate_for_insert()?;
        let body = serde_json::to_string(item)?;
        let now = OffsetDateTime::now_utc();

        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, AuRow>("SELECT * FROM aus WHERE au_id = ?")
            .bind(au_id)
            .fetch_optional(&mut *tx)
            .await?;

        match existing {
            Some(au) if au.active => {}
            Some(au) => {
                let generation = next_generation(Some(au.generation), now_millis());
                sqlx::query(
                    "UPDATE aus SET generation = ?, active = 1, extracted_at = ? WHERE au_id = ?",
                )
                .bind(generation)
                .bind(now)
                .bind(au_id)
                .execute(&mut *tx)
                .await?;
                tracing::debug!(au_id = %au_id, generation, "AU re-extraction started");
            }
            None => {
                let generation = next_generation(None, now_millis());
                sqlx::query(
                    "INSERT INTO aus (au_id, generation, active, extracted_at) VALUES (?, ?, 1, ?)",
                )
                .bind(au_id)
                .bind(generation)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                tracing::debug!(au_id = %au_id, generation, "AU extraction started");
            }
        }

        let item_id = sqlx::query(
            r#"
            INSERT INTO items (
                au_id, doi, issn, eissn, isbn, volume, issue, start_page, access_url, body
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(au_id)
        .bind(item.scalar(keys::DOI).map(str::to_ascii_lowercase))
        .bind(item.scalar(keys::ISSN))
        .bind(item.scalar(keys::EISSN))
        .bind(item.scalar(keys::ISBN))
        .bind(item.scalar(keys::VOLUME))
        .bind(item.scalar(keys::ISSUE))
        .bind(item.scalar(keys::START_PAGE))
        .bind(item.scalar(keys::ACCESS_URL))
        .bind(&body)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;
        Ok(item_id)
    }
}

#[async_trait]
impl CredentialRepo for SqliteStore {
    async fn get_user(&self, username: &str) -> MetadataResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert_user(&self, user: &UserRow) -> MetadataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, roles, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(username) DO UPDATE SET
                password_hash = excluded.password_hash,
                roles = excluded.roles,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.roles)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UrlResolver for SqliteStore {
    async fn resolve_urls(&self, params: &OpenUrlParams) -> MetadataResult<Vec<String>> {
        let criteria = ResolutionCriteria::from_params(params);
        if criteria.is_empty() {
            return Ok(unresolved());
        }

        let mut sql = String::from("SELECT access_url FROM items WHERE 1 = 1");
        let mut binds: Vec<&str> = Vec::new();
        if let Some(doi) = &criteria.doi {
            sql.push_str(" AND doi = ?");
            binds.push(doi);
        }
        if let Some(issn) = &criteria.issn {
            sql.push_str(" AND (issn = ? OR eissn = ?)");
            binds.push(issn);
            binds.push(issn);
        }
        for (value, column) in [
            (&criteria.isbn, "isbn"),
            (&criteria.volume, "volume"),
            (&criteria.issue, "issue"),
            (&criteria.start_page, "start_page"),
        ] {
            if let Some(value) = value {
                sql.push_str(&format!(" AND {column} = ?"));
                binds.push(value);
            }
        }
        sql.push_str(" ORDER BY item_id ASC");

        let mut query = sqlx::query_as::<_, (Option<String>,)>(&sql);
        for value in binds {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;

        if rows.is_empty() {
            return Ok(unresolved());
        }
        Ok(rows
            .into_iter()
            .map(|(url,)| url.unwrap_or_else(|| aumeta_core::openurl::NULL_URL.to_string()))
            .collect())
    }
}

/// Schema applied on every startup; statements are idempotent.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS aus (
    au_id TEXT PRIMARY KEY NOT NULL,
    generation INTEGER NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    extracted_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    au_id TEXT NOT NULL REFERENCES aus(au_id),
    doi TEXT,
    issn TEXT,
    eissn TEXT,
    isbn TEXT,
    volume TEXT,
    issue TEXT,
    start_page TEXT,
    access_url TEXT,
    body TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_au ON items(au_id, item_id);
CREATE INDEX IF NOT EXISTS idx_items_doi ON items(doi);
CREATE INDEX IF NOT EXISTS idx_items_issn ON items(issn);
CREATE INDEX IF NOT EXISTS idx_items_eissn ON items(eissn);

CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY NOT NULL,
    password_hash TEXT NOT NULL,
    roles TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
