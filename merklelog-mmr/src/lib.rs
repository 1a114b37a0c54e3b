//! Merkle Mountain Range (MMR) — an append-only authenticated data structure.
//!
//! This crate provides an MMR implementation backed by pluggable stores,
//! using SHA-256 domain-separated hashing for all merge operations, plus the
//! inclusion proof types a massif engine builds receipts from.
//!
//! # Core types
//!
//! - [`MMR`] — the main MMR struct (push, root, proof, commit).
//! - [`MerkleProof`] — in-memory MMR inclusion proof (verify, calculate root).
//! - [`InclusionProof`] — its CBOR-serializable wire form.
//! - [`MmrNode`] — the element type stored in the MMR.
//!
//! # Store traits
//!
//! - [`MMRStoreReadOps`] — read an element by MMR position.
//! - [`MMRStoreWriteOps`] — persist a contiguous run of elements.
//! - [`MemStore`] — in-memory store (requires `mem_store` feature).

#![warn(missing_docs)]

mod error;
/// In-memory MMR store (requires `mem_store` feature).
#[cfg(any(test, feature = "mem_store"))]
pub mod mem_store;
mod mmr;
mod mmr_store;
mod node;
pub(crate) mod pos;
mod proof;

pub use error::{Error, Result};
#[cfg(any(test, feature = "mem_store"))]
pub use mem_store::MemStore;
pub use merklelog_u64::mmr_index;
pub use mmr::MMR;
pub use mmr_store::{MMRBatch, MMRStoreReadOps, MMRStoreWriteOps};
pub use node::{MmrNode, leaf_hash, merge_hash};
pub use pos::{get_peak_map, get_peaks, mmr_size_to_leaf_count};
pub use proof::{InclusionProof, MerkleProof, VerifiedLeaves};
