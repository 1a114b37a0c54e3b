//! The cache's row shape (spec §4.6).

use serde::{Deserialize, Serialize};

/// What the cache answers `resolve(contentHash)` with: where a sequenced
/// statement landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The leaf's timestamp-sortable identifier, as assigned at enqueue
    /// time and carried into the leaf record.
    pub id_timestamp: u64,
    /// The leaf's position in its log's MMR (all-nodes numbering).
    pub mmr_index: u64,
    /// The massif height in effect when this leaf was sequenced.
    pub massif_height: u8,
}
