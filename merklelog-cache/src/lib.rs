//! Per-log sequenced-index cache (spec §4.6): `contentHash ->
//! (idtimestamp, mmrIndex, massifHeight)` over the most recently sequenced
//! window of a log, FIFO-evicted at massif capacity.

#![warn(missing_docs)]

mod cache;
mod entry;
mod error;

pub use cache::Cache;
pub use entry::IndexEntry;
pub use error::{Error, Result};
