//! `U64` wrapping arithmetic and pure Merkle Mountain Range index math.
//!
//! This crate has no I/O and no storage dependency: it is the hard
//! arithmetic core that the massif layout, leaf enumerator, and sequencer
//! build on top of. Every function is a pure transform with no side
//! effects, which makes it directly property-testable (see the `tests`
//! modules below and `merklelog-massif`'s round-trip tests).

#![warn(missing_docs)]

mod error;
mod mmr_math;
mod u64_ops;

pub use error::{Error, Result};
pub use mmr_math::{
    height, height_index, leaf_count, leaf_count_for_massif_height, leaf_count_from_height_index,
    leaf_minus_spur_sum, massif_first_leaf, mmr_index, mmr_index_from_leaf_index, mmr_position,
    mmr_size_from_height_index,
};
pub use u64_ops::U64;
