//! Top-level wiring for the massif engine: process configuration, tracing
//! setup, and (feature `http`) a thin CBOR/Problem-Details surface over the
//! sharded sequencing queue (spec §6, `SPEC_FULL.md` §0/§10/§11).
//!
//! The layers below this crate — `merklelog-u64`, `merklelog-mmr`,
//! `merklelog-massif`, `merklelog-storage`, `merklelog-queue`,
//! `merklelog-sequencer`, `merklelog-cache` — are all transport- and
//! process-agnostic; this crate is the one place that knows about the
//! environment, logging, and (optionally) HTTP.

#![warn(missing_docs)]

mod config;
mod error;
pub mod pipeline;

#[cfg(feature = "http")]
pub mod http;

pub use config::{EngineConfig, init_tracing};
pub use error::{EngineError, Result};
