//! In-memory metadata store.
//!
//! Nothing is persisted; all state is lost when the process exits. Useful for
//! tests and throwaway deployments.

use crate::error::MetadataResult;
use crate::models::UserRow;
use crate::repos::items::{next_generation, now_millis};
use crate::repos::resolver::unresolved;
use crate::repos::{CredentialRepo, ItemRepo, ResolutionCriteria, UrlResolver};
use crate::store::MetadataStore;
use async_trait::async_trait;
use aumeta_core::ItemMetadata;
use aumeta_core::item::keys;
use aumeta_core::openurl::{NULL_URL, OpenUrlParams};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug)]
struct AuState {
    generation: i64,
    active: bool,
    items: BTreeMap<i64, ItemMetadata>,
}

#[derive(Debug, Default)]
struct Inner {
    aus: HashMap<String, AuState>,
    users: HashMap<String, UserRow>,
    last_item_id: i64,
}

/// Metadata store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn migrate(&self) -> MetadataResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ItemRepo for MemoryStore {
    async fn current_generation(&self, au_id: &str) -> MetadataResult<Option<i64>> {
        let inner = self.inner.read().await;
        Ok(inner
            .aus
            .get(au_id)
            .filter(|au| au.active)
            .map(|au| au.generation))
    }

    async fn scan_items(
        &self,
        au_id: &str,
        after_id: Option<i64>,
        limit: u32,
    ) -> MetadataResult<Vec<ItemMetadata>> {
        let inner = self.inner.read().await;
        let Some(au) = inner.aus.get(au_id) else {
            return Ok(Vec::new());
        };

        let start = after_id.map_or(i64::MIN, |id| id.saturating_add(1));
        if after_id == Some(i64::MAX) {
            return Ok(Vec::new());
        }

        Ok(au
            .items
            .range(start..)
            .take(limit as usize)
            .map(|(id, item)| {
                let mut item = item.clone();
                item.id = Some(*id);
                item
            })
            .collect())
    }

    async fn delete_au(&self, au_id: &str) -> MetadataResult<Option<u64>> {
        let mut inner = self.inner.write().await;
        match inner.aus.get_mut(au_id) {
            Some(au) if au.active => {
                let deleted = au.items.len() as u64;
                au.items.clear();
                au.active = false;
                Ok(Some(deleted))
            }
            _ => Ok(None),
        }
    }

    async fn insert_item(&self, item: &ItemMetadata) -> MetadataResult<i64> {
        let au_id = item.validate_for_insert()?;
        let mut inner = self.inner.write().await;

        inner.last_item_id += 1;
        let item_id = inner.last_item_id;

        let au = inner
            .aus
            .entry(au_id.to_string())
            .or_insert_with(|| AuState {
                generation: 0,
                active: false,
                items: BTreeMap::new(),
            });
        if !au.active {
            let previous = (au.generation > 0).then_some(au.generation);
            au.generation = next_generation(previous, now_millis());
            au.active = true;
            tracing::debug!(au_id = %au_id, generation = au.generation, "AU extraction started");
        }
        au.items.insert(item_id, item.clone());

        Ok(item_id)
    }
}

#[async_trait]
impl CredentialRepo for MemoryStore {
    async fn get_user(&self, username: &str) -> MetadataResult<Option<UserRow>> {
        Ok(self.inner.read().await.users.get(username).cloned())
    }

    async fn upsert_user(&self, user: &UserRow) -> MetadataResult<()> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&user.username) {
            Some(existing) => {
                existing.password_hash = user.password_hash.clone();
                existing.roles = user.roles.clone();
                existing.updated_at = user.updated_at;
            }
            None => {
                inner.users.insert(user.username.clone(), user.clone());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UrlResolver for MemoryStore {
    async fn resolve_urls(&self, params: &OpenUrlParams) -> MetadataResult<Vec<String>> {
        let criteria = ResolutionCriteria::from_params(params);
        if criteria.is_empty() {
            return Ok(unresolved());
        }

        let inner = self.inner.read().await;
        let mut hits: Vec<(i64, String)> = inner
            .aus
            .values()
            .flat_map(|au| au.items.iter())
            .filter(|(_, item)| criteria.matches(item))
            .map(|(id, item)| {
                let url = item.scalar(keys::ACCESS_URL).unwrap_or(NULL_URL);
                (*id, url.to_string())
            })
            .collect();

        if hits.is_empty() {
            return Ok(unresolved());
        }
        hits.sort_by_key(|(id, _)| *id);
        Ok(hits.into_iter().map(|(_, url)| url).collect())
    }
}
