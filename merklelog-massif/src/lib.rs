//! Massif blob layout, storage paths, the leaf record codec, and the leaf
//! enumerator (spec §3.3–§3.5, §4.2, §4.3).
//!
//! [`MassifBlob`] is the concrete byte-buffer type: its fixed regions carry
//! the leaf table, and its append region backs a `merklelog_mmr::MMR` store
//! (via [`MMRStoreReadOps`](merklelog_mmr::MMRStoreReadOps)/
//! [`MMRStoreWriteOps`](merklelog_mmr::MMRStoreWriteOps)).

#![warn(missing_docs)]

mod blob;
mod checkpoint;
mod enumerator;
mod error;
mod layout;
mod leaf;
mod path;

pub use blob::MassifBlob;
pub use checkpoint::Checkpoint;
pub use enumerator::{LeafEntry, LeafEnumerator, LeafFields, enumerate_leaves};
pub use error::{Error, Result};
pub use layout::{
    APPEND_ENTRY_SIZE, FRONTIER_STATE_SIZE, INDEX_HEADER_SIZE, LEAF_RECORD_SIZE, MAX_MMR_HEIGHT,
    PEAK_STACK_SIZE, START_HEADER_SIZE, index_data_bytes_v2, leaf_count_for_height,
    massif_log_entries, peak_stack_end, urkle_leaf_table_start_byte_offset,
};
pub use leaf::LeafRecord;
pub use path::{PathKind, StoragePath, checkpoint_path, massif_blob_path, parse_storage_path};
