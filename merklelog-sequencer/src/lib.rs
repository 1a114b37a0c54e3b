//! Sequencer and massif writer (spec §4.5).
//!
//! Pulls belong to `merklelog-queue`; this crate only turns an already-pulled
//! [`merklelog_queue::dto::LogGroup`] into durable massif bytes and tells the
//! caller what to ack.

#![warn(missing_docs)]

mod error;
mod sequencer;

pub use error::{Error, Result};
pub use sequencer::{AckCommand, DeadLetter, SequenceOutcome, sequence_group};
