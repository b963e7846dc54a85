//! In-process Base with the same key and query semantics as the hosted store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::base::{with_key, Base, Item};
use crate::error::{StoreError, StoreResult};
use crate::query::Query;

/// Shared in-memory Base. Clones see the same items.
#[derive(Debug, Clone, Default)]
pub struct MemoryBase {
    items: Arc<RwLock<BTreeMap<String, Item>>>,
}

impl MemoryBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Snapshot of every stored item, ordered by key
    pub async fn items(&self) -> Vec<Item> {
        self.items.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl Base for MemoryBase {
    async fn get(&self, key: &str) -> StoreResult<Option<Item>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn fetch(&self, query: Query) -> StoreResult<Vec<Item>> {
        Ok(self
            .items
            .read()
            .await
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect())
    }

    async fn insert(&self, key: &str, item: Item) -> StoreResult<Item> {
        let mut items = self.items.write().await;
        if items.contains_key(key) {
            return Err(StoreError::KeyExists(key.to_string()));
        }

        let item = with_key(key, item);
        items.insert(key.to_string(), item.clone());
        Ok(item)
    }

    async fn put(&self, key: &str, item: Item) -> StoreResult<Item> {
        let item = with_key(key, item);
        self.items.write().await.insert(key.to_string(), item.clone());
        Ok(item)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.items.write().await.remove(key);
        Ok(())
    }
}
