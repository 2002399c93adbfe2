//! Metadata store abstraction and implementations for aumeta.
//!
//! This crate owns the persistent state behind the service:
//! - AU extraction generations and their items
//! - User credentials and granted roles
//! - OpenURL resolution over stored items

pub mod error;
pub mod memory;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use memory::MemoryStore;
pub use store::{MetadataStore, SqliteStore};

use aumeta_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite {
            path,
            busy_timeout_secs,
        } => {
            tracing::info!(path = %path.display(), "Opening SQLite metadata store");
            let store = SqliteStore::new(path, *busy_timeout_secs).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
        MetadataConfig::Memory => {
            tracing::warn!("Using in-memory metadata store; contents are lost on restart");
            Ok(Arc::new(MemoryStore::new()) as Arc<dyn MetadataStore>)
        }
    }
}
