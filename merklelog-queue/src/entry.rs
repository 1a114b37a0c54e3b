//! Queue entities (spec §3.6).

use crate::{ContentHash, IdTimestamp, LogId};

/// Four fixed extra byte-string slots carried alongside a queued entry.
///
/// The first three map onto the massif leaf record's `extra1`/`extra2`/
/// `extra3` fields when the sequencer writes the leaf (truncated or
/// zero-padded to fit); the fourth is retained for observability
/// (`recentEntries`) but has no leaf-record counterpart. Spec §3.6 and §8
/// scenario A disagree on the array's width (`extras[0..3]` vs. `extras=nil
/// *4`); this is the Open Question decision recorded in `DESIGN.md`.
pub type Extras = [Vec<u8>; 4];

pub(crate) struct EntryLease {
    pub poller_id: String,
    pub expires_at_ms: u64,
}

/// An entry owned by one shard, from enqueue to ack (spec §3.6, §4.4.2).
pub struct PendingEntry {
    /// The shard-global sequence number assigned at enqueue time.
    pub seq: u64,
    /// The log this entry belongs to.
    pub log_id: LogId,
    /// The content hash of the signed statement.
    pub content_hash: ContentHash,
    /// Fixed extra byte-string slots.
    pub extras: Extras,
    /// Timestamp-sortable identifier assigned at enqueue time.
    pub id_timestamp: IdTimestamp,
    /// Wall-clock milliseconds at enqueue time.
    pub enqueued_at_ms: u64,
    pub(crate) lease: Option<EntryLease>,
}

impl PendingEntry {
    /// `true` if this entry currently has an unexpired lease, as of
    /// `now_ms`.
    pub fn is_leased(&self, now_ms: u64) -> bool {
        self.lease.as_ref().is_some_and(|l| l.expires_at_ms > now_ms)
    }
}

/// Bounded, ring-buffered observability record (spec §3.6 `recent[seq]`).
#[derive(Debug, Clone)]
pub struct RecentEntry {
    /// The shard-global sequence number.
    pub seq: u64,
    /// The log this entry belongs to.
    pub log_id: LogId,
    /// The content hash of the signed statement.
    pub content_hash: ContentHash,
    /// Wall-clock milliseconds at enqueue time.
    pub enqueued_at_ms: u64,
    /// Wall-clock milliseconds at ack time, if acked.
    pub acked_at_ms: Option<u64>,
    /// The final leaf index, once sequenced.
    pub leaf_index: Option<u64>,
    /// The massif the leaf landed in, once sequenced.
    pub massif_index: Option<u64>,
}

impl RecentEntry {
    /// `ackedAt - enqueuedAt`, once acked.
    pub fn sequencing_latency_ms(&self) -> Option<u64> {
        self.acked_at_ms.map(|acked| acked.saturating_sub(self.enqueued_at_ms))
    }
}

/// A dead-lettered entry (spec §3.6 `deadLetters[]`), recorded when the
/// sequencer gives up on an entry — bounded retries exhausted, or a
/// `LeafConflict` (spec §7).
#[derive(Debug, Clone)]
pub struct DeadLetterRecord {
    /// The shard-global sequence number.
    pub seq: u64,
    /// The log this entry belonged to.
    pub log_id: LogId,
    /// The content hash of the signed statement.
    pub content_hash: ContentHash,
    /// Why the entry was dead-lettered.
    pub reason: String,
    /// Wall-clock milliseconds when recorded.
    pub recorded_at_ms: u64,
}
