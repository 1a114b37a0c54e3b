//! Abstract key-value store binding (spec §1), backing the per-log
//! sequenced-index cache (spec §4.6).

use async_trait::async_trait;
use std::{collections::BTreeMap, sync::Mutex};

use crate::Result;

/// A small durable key-value binding, standing in for the "SQLite-shaped
/// storage" spec §5 describes for the per-log cache.
///
/// Keys and values are opaque bytes; the cache layer owns encoding.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value at `key`, or `None` if absent.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or overwrite the value at `key`.
    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Remove the entry at `key`, if present.
    async fn delete(&self, key: &[u8]) -> Result<()>;

    /// Iterate every stored key in ascending byte order. Used by the
    /// cache's FIFO eviction to find the oldest entries.
    async fn keys(&self) -> Result<Vec<Vec<u8>>>;
}

/// An in-memory [`KvStore`] for tests.
#[derive(Default)]
pub struct MemKvStore(Mutex<BTreeMap<Vec<u8>, Vec<u8>>>);

impl MemKvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemKvStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.0.lock().expect("lock poisoned").get(key).cloned())
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.0.lock().expect("lock poisoned").insert(key.to_vec(), value);
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<()> {
        self.0.lock().expect("lock poisoned").remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<Vec<u8>>> {
        Ok(self.0.lock().expect("lock poisoned").keys().cloned().collect())
    }
}
