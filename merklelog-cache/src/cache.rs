//! The sequenced-index cache itself (spec §4.6).

use merklelog_massif::{LeafFields, enumerate_leaves};
use merklelog_storage::KvStore;
use merklelog_u64::{leaf_count_for_massif_height, mmr_index};

use crate::{Error, IndexEntry, Result};

/// `row/{logId}/{contentHashHex}` holds the CBOR-encoded [`IndexEntry`] a
/// `resolve` answers with.
fn row_key(log_id: &str, content_hash_hex: &str) -> Vec<u8> {
    format!("row/{log_id}/{content_hash_hex}").into_bytes()
}

/// `seq/{logId}/{idtimestamp as 20-digit decimal}/{contentHashHex}` holds
/// the bare content hash. Ascending byte order on this prefix is ascending
/// `idtimestamp` order, which is exactly the FIFO eviction order §4.6
/// wants, so [`KvStore::keys`] alone is enough to find the oldest rows —
/// no secondary in-memory structure needed.
fn seq_key(log_id: &str, id_timestamp: u64, content_hash_hex: &str) -> Vec<u8> {
    format!("seq/{log_id}/{id_timestamp:020}/{content_hash_hex}").into_bytes()
}

fn seq_prefix(log_id: &str) -> Vec<u8> {
    format!("seq/{log_id}/").into_bytes()
}

/// Per-log sequenced-index cache: answers "where did this content hash get
/// sequenced" from the most recent `2^(massifHeight - 1)` leaves, backed by
/// a [`KvStore`].
pub struct Cache<S> {
    store: S,
}

impl<S: KvStore> Cache<S> {
    /// Wrap a backing store.
    pub fn new(store: S) -> Self {
        Cache { store }
    }

    /// Enumerate `count` leaves starting at massif-local ordinal `start`
    /// out of `blob_bytes` (a massif `(logId, massifHeight, massifIndex)`),
    /// and upsert each `(contentHash, idtimestamp, mmrIndex, massifHeight)`
    /// into the index, then evict oldest-by-`idtimestamp` rows until the
    /// log's row count is back at capacity.
    pub async fn ingest(
        &self,
        log_id: &str,
        massif_height: u8,
        massif_index: u64,
        blob_bytes: &[u8],
        start: u64,
        count: u64,
    ) -> Result<()> {
        let leaves_per_massif = leaf_count_for_massif_height(massif_height);
        let fields = LeafFields {
            idtimestamp: true,
            value_bytes: true,
            ..Default::default()
        };
        for entry in enumerate_leaves(blob_bytes, massif_height, start, count, fields) {
            let entry = entry?;
            let value_bytes = entry.value_bytes.expect("requested above");
            if value_bytes.len() != 32 {
                return Err(Error::MalformedContentHash(value_bytes.len()));
            }
            let id_timestamp = entry.idtimestamp.expect("requested above");
            let global_leaf_index = leaves_per_massif * massif_index + entry.ordinal;
            let row = IndexEntry {
                id_timestamp,
                mmr_index: mmr_index(global_leaf_index),
                massif_height,
            };
            let content_hash_hex = hex::encode(value_bytes);
            self.put_row(log_id, &content_hash_hex, id_timestamp, &row).await?;
        }
        self.evict_to_capacity(log_id, leaves_per_massif).await
    }

    async fn put_row(
        &self,
        log_id: &str,
        content_hash_hex: &str,
        id_timestamp: u64,
        row: &IndexEntry,
    ) -> Result<()> {
        let mut bytes = Vec::new();
        ciborium::into_writer(row, &mut bytes).expect("IndexEntry is representable in CBOR");
        self.store.put(&row_key(log_id, content_hash_hex), bytes).await?;
        self.store
            .put(&seq_key(log_id, id_timestamp, content_hash_hex), content_hash_hex.as_bytes().to_vec())
            .await?;
        Ok(())
    }

    async fn evict_to_capacity(&self, log_id: &str, capacity: u64) -> Result<()> {
        let prefix = seq_prefix(log_id);
        let mut ordering: Vec<_> = self
            .store
            .keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(&prefix))
            .collect();
        ordering.sort();
        let excess = ordering.len().saturating_sub(capacity as usize);
        for key in ordering.into_iter().take(excess) {
            let content_hash_hex = match self.store.get(&key).await? {
                Some(bytes) => String::from_utf8(bytes)
                    .map_err(|_| Error::CorruptRow(format!("{}: non-utf8 content hash", String::from_utf8_lossy(&key))))?,
                None => continue,
            };
            self.store.delete(&row_key(log_id, &content_hash_hex)).await?;
            self.store.delete(&key).await?;
        }
        Ok(())
    }

    /// Answer "where did this content hash get sequenced", or `None` if
    /// it isn't in the current window, the log is unknown, or the lookup
    /// itself failed — per §7, lookup failures never propagate as errors.
    pub async fn resolve(&self, log_id: &str, content_hash: &[u8; 32]) -> Option<IndexEntry> {
        let content_hash_hex = hex::encode(content_hash);
        match self.store.get(&row_key(log_id, &content_hash_hex)).await {
            Ok(Some(bytes)) => match ciborium::from_reader::<IndexEntry, _>(bytes.as_slice()) {
                Ok(row) => Some(row),
                Err(e) => {
                    tracing::warn!(log_id, content_hash = %content_hash_hex, error = %e, "corrupt cache row");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(log_id, content_hash = %content_hash_hex, error = %e, "cache lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merklelog_massif::{LeafRecord, urkle_leaf_table_start_byte_offset};
    use merklelog_storage::MemKvStore;

    const MASSIF_HEIGHT: u8 = 3; // capacity 4

    fn blob_with_leaves(leaves: &[LeafRecord]) -> Vec<u8> {
        let start = urkle_leaf_table_start_byte_offset(MASSIF_HEIGHT) as usize;
        let mut buf = vec![0u8; start + leaves.len() * 128];
        for (i, leaf) in leaves.iter().enumerate() {
            let off = start + i * 128;
            buf[off..off + 128].copy_from_slice(&leaf.encode());
        }
        buf
    }

    fn leaf(idtimestamp: u64, value_byte: u8) -> LeafRecord {
        LeafRecord {
            idtimestamp,
            value_bytes: [value_byte; 32],
            extra1: [0u8; 24],
            extra2: [0u8; 32],
            extra3: [0u8; 32],
        }
    }

    #[tokio::test]
    async fn ingest_then_resolve_round_trips() {
        let cache = Cache::new(MemKvStore::new());
        let leaves = vec![leaf(100, 1), leaf(200, 2)];
        let buf = blob_with_leaves(&leaves);
        cache.ingest("log-a", MASSIF_HEIGHT, 0, &buf, 0, 2).await.unwrap();

        let hash = [2u8; 32];
        let row = cache.resolve("log-a", &hash).await.unwrap();
        assert_eq!(row.id_timestamp, 200);
        assert_eq!(row.massif_height, MASSIF_HEIGHT);
        assert_eq!(row.mmr_index, mmr_index(1));
    }

    #[tokio::test]
    async fn unknown_content_hash_resolves_to_none() {
        let cache = Cache::new(MemKvStore::new());
        assert!(cache.resolve("log-a", &[9u8; 32]).await.is_none());
    }

    #[tokio::test]
    async fn eviction_keeps_row_count_at_capacity() {
        let cache = Cache::new(MemKvStore::new());
        // capacity is 4; ingest 6 leaves one notification at a time, each
        // notification covering just the one new leaf at local ordinal 0
        // of its own single-leaf buffer.
        let all_leaves: Vec<_> = (0..6u64).map(|i| leaf(i * 10, i as u8 + 1)).collect();
        for l in &all_leaves {
            let buf = blob_with_leaves(std::slice::from_ref(l));
            cache.ingest("log-a", MASSIF_HEIGHT, 0, &buf, 0, 1).await.unwrap();
        }

        let prefix = seq_prefix("log-a");
        let remaining: Vec<_> = cache
            .store
            .keys()
            .await
            .unwrap()
            .into_iter()
            .filter(|k| k.starts_with(&prefix))
            .collect();
        assert_eq!(remaining.len(), 4);

        // the two oldest (idtimestamp 0 and 10) were evicted.
        assert!(cache.resolve("log-a", &[1u8; 32]).await.is_none());
        assert!(cache.resolve("log-a", &[2u8; 32]).await.is_none());
        // the four most recent survive.
        for value_byte in 3u8..=6 {
            assert!(cache.resolve("log-a", &[value_byte; 32]).await.is_some());
        }
    }

    #[tokio::test]
    async fn reingesting_same_leaf_is_idempotent() {
        let cache = Cache::new(MemKvStore::new());
        let buf = blob_with_leaves(&[leaf(50, 7)]);
        cache.ingest("log-a", MASSIF_HEIGHT, 0, &buf, 0, 1).await.unwrap();
        cache.ingest("log-a", MASSIF_HEIGHT, 0, &buf, 0, 1).await.unwrap();

        let prefix = seq_prefix("log-a");
        let remaining = cache.store.keys().await.unwrap().into_iter().filter(|k| k.starts_with(&prefix)).count();
        assert_eq!(remaining, 1);
    }
}
