//! Document store operations used by the user adapter.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreResult;
use crate::query::Query;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A stored document. Items returned by a `Base` always carry their `key` field.
pub type Item = Map<String, Value>;

/// Field holding an item's key
pub const KEY_FIELD: &str = "key";

/// One collection ("Base") of the document store.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Base: Send + Sync {
    /// Point lookup by key
    async fn get(&self, key: &str) -> StoreResult<Option<Item>>;

    /// All items matching the query, following the store's paging
    async fn fetch(&self, query: Query) -> StoreResult<Vec<Item>>;

    /// Store a new item; fails with `StoreError::KeyExists` if the key is taken
    async fn insert(&self, key: &str, item: Item) -> StoreResult<Item>;

    /// Store an item, replacing any existing one under the key
    async fn put(&self, key: &str, item: Item) -> StoreResult<Item>;

    /// Remove an item. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Set the `key` field of an item
pub fn with_key(key: &str, mut item: Item) -> Item {
    item.insert(KEY_FIELD.to_string(), Value::String(key.to_string()));
    item
}
