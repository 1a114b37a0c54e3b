//! Sharded durable sequencing queue (spec §4.4).
//!
//! Each log is routed to exactly one shard ([`shard_index_for_log`]); a
//! [`Shard`] is a single-writer state machine with lease-based pull/ack
//! semantics. This crate is transport-agnostic — `merklelog-engine` maps
//! [`dto`] request/response shapes onto HTTP.

#![warn(missing_docs)]

pub mod dto;
mod entry;
pub mod env;
mod error;
mod scalars;
mod shard;
mod sharding;

pub use entry::{DeadLetterRecord, Extras, PendingEntry, RecentEntry};
pub use error::{Error, Result};
pub use scalars::{ContentHash, IdTimestamp, LogId};
pub use shard::Shard;
pub use sharding::{djb2, shard_index_for_log, shard_name};
