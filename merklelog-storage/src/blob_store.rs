//! Abstract object store binding (spec §1, §6.2).

use async_trait::async_trait;
use std::{collections::BTreeMap, sync::Mutex};

use crate::Result;

/// The object store the massif engine persists blobs to and reads them
/// back from, keyed by the bit-exact paths of spec §3.5.
///
/// Real bindings (an actual object store) are out of scope (spec §1); this
/// trait exists so the core can be built and tested against it without
/// depending on a concrete backend.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the bytes at `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrite (or create) the object at `key` with `value`.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// List every key with the given prefix. Used by the cache's rebuild
    /// path to enumerate a log's massifs.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// An in-memory [`BlobStore`] for tests.
#[derive(Default)]
pub struct MemBlobStore(Mutex<BTreeMap<String, Vec<u8>>>);

impl MemBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.0.lock().expect("lock poisoned").get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.0.lock().expect("lock poisoned").insert(key.to_string(), value);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .0
            .lock()
            .expect("lock poisoned")
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
