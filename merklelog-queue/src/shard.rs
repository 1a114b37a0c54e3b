//! Per-shard single-writer state machine (spec §4.4).
//!
//! A `Shard` owns one slice of the durable sequencing queue. Callers never
//! see another shard's state; routing a log to its shard is
//! [`crate::shard_index_for_log`]'s job, one layer up.

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::dto::{AckRequest, AckResponse, LogGroup, PullRequest, PullResponse, QueuedEntry, QueueStats, RecentEntryView};
use crate::entry::{DeadLetterRecord, EntryLease, Extras, PendingEntry, RecentEntry};
use crate::error::{Error, Result};
use crate::scalars::{ContentHash, IdTimestamp, LogId};

/// One shard's durable state (spec §3.6, §4.4.1).
pub struct Shard {
    next_seq: u64,
    pending: BTreeMap<u64, PendingEntry>,
    recent: VecDeque<RecentEntry>,
    dead_letters: Vec<DeadLetterRecord>,
    max_pending: u64,
    max_pollers: u32,
    recent_capacity: usize,
}

/// `retryAfterSeconds` for a rejected `enqueue` (spec §7).
///
/// Spec §4.4.1 frames this as a fill-ratio tiering (>=1.0 -> 30s, >=0.9 ->
/// 10s, else 5s), but `enqueue`'s only rejection gate is the hard
/// `pending_count >= max_pending` check, so the ratio at the moment of
/// rejection is always exactly 1.0. The 10s/5s tiers have no call site that
/// could ever produce them and are dropped rather than kept as unreachable
/// branches; see `DESIGN.md` for this Open Question decision.
/// `MAX_PENDING`/`MAX_POLLERS` have no spec-given numeric defaults; see
/// `env::default_max_pending` et al. for the chosen values.
fn retry_after_seconds() -> u32 {
    30
}

impl Shard {
    /// A fresh, empty shard.
    pub fn new(max_pending: u64, max_pollers: u32, recent_capacity: usize) -> Self {
        Shard {
            next_seq: 0,
            pending: BTreeMap::new(),
            recent: VecDeque::new(),
            dead_letters: Vec::new(),
            max_pending,
            max_pollers,
            recent_capacity,
        }
    }

    /// Distinct pollers currently holding at least one unexpired lease.
    fn active_poller_count(&self, now_ms: u64) -> usize {
        self.pending
            .values()
            .filter(|e| e.is_leased(now_ms))
            .map(|e| e.lease.as_ref().expect("is_leased implies lease").poller_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Append a new entry, assigning it the next `seq` (spec §4.4.2).
    ///
    /// Fails with [`Error::QueueFull`] once `pending.len() >= max_pending`.
    pub fn enqueue(
        &mut self,
        log_id: LogId,
        content_hash: ContentHash,
        extras: Extras,
        now_ms: u64,
    ) -> Result<u64> {
        let pending_count = self.pending.len() as u64;
        if pending_count >= self.max_pending {
            return Err(Error::QueueFull {
                pending_count,
                max_pending: self.max_pending,
                retry_after_seconds: retry_after_seconds(),
            });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(
            seq,
            PendingEntry {
                seq,
                log_id,
                content_hash,
                extras,
                id_timestamp: IdTimestamp::new(now_ms),
                enqueued_at_ms: now_ms,
                lease: None,
            },
        );
        self.push_recent(RecentEntry {
            seq,
            log_id,
            content_hash,
            enqueued_at_ms: now_ms,
            acked_at_ms: None,
            leaf_index: None,
            massif_index: None,
        });
        Ok(seq)
    }

    /// Lease up to `batch_size` unleased entries to `poller_id` (spec
    /// §4.4.2).
    ///
    /// Entries are grouped into [`LogGroup`]s by contiguous shard-global
    /// `seq` runs sharing one `logId`, preserving per-log ordering for the
    /// sequencer (spec §8 invariant 8).
    pub fn pull(&mut self, req: PullRequest, now_ms: u64) -> Result<PullResponse> {
        if req.batch_size == 0 {
            return Err(Error::InvalidRequest("batchSize must be > 0".to_string()));
        }
        let already_active = self
            .pending
            .values()
            .any(|e| e.is_leased(now_ms) && e.lease.as_ref().is_some_and(|l| l.poller_id == req.poller_id));
        if !already_active && self.active_poller_count(now_ms) >= self.max_pollers as usize {
            return Err(Error::PollerLimitReached);
        }

        let mut selected: Vec<(u64, LogId, ContentHash, IdTimestamp, Extras)> = Vec::new();
        let expires_at_ms = now_ms + req.visibility_ms as u64;
        for (&seq, entry) in self.pending.iter_mut() {
            if selected.len() as u32 >= req.batch_size {
                break;
            }
            if entry.is_leased(now_ms) {
                continue;
            }
            entry.lease = Some(EntryLease { poller_id: req.poller_id.clone(), expires_at_ms });
            selected.push((seq, entry.log_id, entry.content_hash, entry.id_timestamp, entry.extras.clone()));
        }

        let lease_expiry = if selected.is_empty() { now_ms } else { expires_at_ms };
        Ok(PullResponse { version: 1, lease_expiry, log_groups: build_log_groups(selected) })
    }

    /// Acknowledge a contiguous range of entries previously pulled by
    /// `req.poller_id`, recording the leaf placement the sequencer assigned
    /// them (spec §4.4.2, §9).
    ///
    /// Idempotent: seqs already acked (or never enqueued) are silently
    /// skipped rather than erroring, so a retried ack after a crashed
    /// sequencer reply is safe.
    pub fn ack(&mut self, req: AckRequest, now_ms: u64) -> Result<AckResponse> {
        if req.limit == 0 {
            return Err(Error::InvalidRequest("limit must be > 0".to_string()));
        }
        let log_id = LogId::new(req.log_id);
        let seqs: Vec<u64> = (req.seq_lo..req.seq_lo + req.limit as u64).collect();

        // Validate lease ownership before mutating anything, so a rejected
        // ack never partially applies.
        for &seq in &seqs {
            if let Some(entry) = self.pending.get(&seq) {
                if entry.log_id != log_id {
                    return Err(Error::InvalidRequest(format!("seq {seq} belongs to a different log")));
                }
                let owned_by_caller =
                    entry.lease.as_ref().is_some_and(|l| l.poller_id == req.poller_id && l.expires_at_ms > now_ms);
                if !owned_by_caller {
                    return Err(Error::NotLeasedByCaller);
                }
            }
        }

        let mut acked = 0u32;
        for &seq in &seqs {
            if self.pending.remove(&seq).is_none() {
                continue;
            }
            let leaf_index = req.first_leaf_index + (seq - req.seq_lo);
            let massif_index = leaf_index >> req.massif_height;
            if let Some(recent) = self.recent.iter_mut().find(|r| r.seq == seq) {
                recent.acked_at_ms = Some(now_ms);
                recent.leaf_index = Some(leaf_index);
                recent.massif_index = Some(massif_index);
            }
            acked += 1;
        }
        Ok(AckResponse { acked })
    }

    /// Remove `seq` from `pending` and record it as dead-lettered (used by
    /// the sequencer on a `LeafConflict` or exhausted retries, spec §7).
    pub fn record_dead_letter(&mut self, seq: u64, reason: String, now_ms: u64) {
        let Some(entry) = self.pending.remove(&seq) else { return };
        self.dead_letters.push(DeadLetterRecord {
            seq,
            log_id: entry.log_id,
            content_hash: entry.content_hash,
            reason,
            recorded_at_ms: now_ms,
        });
    }

    /// A point-in-time summary (spec §6.1 `GET /queue/stats`).
    pub fn stats(&self, now_ms: u64) -> QueueStats {
        let pending = self.pending.len() as u64;
        let oldest_entry_age_ms = self.pending.values().map(|e| e.enqueued_at_ms).min().map(|t| now_ms.saturating_sub(t));
        let active_pollers = self.active_poller_count(now_ms) as u64;
        QueueStats {
            pending,
            dead_letters: self.dead_letters.len() as u64,
            oldest_entry_age_ms,
            active_pollers,
            poller_limit_reached: active_pollers >= self.max_pollers as u64,
        }
    }

    /// The most recent `limit` observability records, newest first (spec
    /// §6.1 `GET /queue/debug/recent`).
    pub fn recent_entries(&self, limit: usize) -> Vec<RecentEntryView> {
        self.recent
            .iter()
            .rev()
            .take(limit)
            .map(|r| RecentEntryView {
                seq: r.seq,
                log_id: r.log_id,
                content_hash: r.content_hash,
                enqueued_at_ms: r.enqueued_at_ms,
                acked_at_ms: r.acked_at_ms,
                sequencing_latency_ms: r.sequencing_latency_ms(),
            })
            .collect()
    }

    /// Current pending-entry count, for `GET /queue/shards`.
    pub fn pending_count(&self) -> u64 {
        self.pending.len() as u64
    }

    /// Dead-lettered entries recorded so far (spec §3.6 `deadLetters[]`,
    /// SPEC_FULL §11 dead-letter inspection).
    pub fn dead_letters(&self) -> &[DeadLetterRecord] {
        &self.dead_letters
    }

    fn push_recent(&mut self, entry: RecentEntry) {
        if self.recent.len() >= self.recent_capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(entry);
    }
}

/// Group selected entries into contiguous per-log `seq` runs (spec §4.4.2).
///
/// A run extends only while both the log matches and the `seq` is exactly
/// one more than the group's current high-water mark; anything else opens a
/// new group. `active` tracks, per log, the index of its currently-open
/// group so interleaved logs don't need to scan backwards.
fn build_log_groups(entries: Vec<(u64, LogId, ContentHash, IdTimestamp, Extras)>) -> Vec<LogGroup> {
    let mut groups: Vec<LogGroup> = Vec::new();
    let mut active: std::collections::HashMap<LogId, usize> = std::collections::HashMap::new();
    for (seq, log_id, content_hash, id_timestamp, extras) in entries {
        let queued = QueuedEntry {
            seq,
            content_hash: *content_hash.as_bytes(),
            id_timestamp: id_timestamp.get(),
            extras: extras.to_vec(),
        };
        if let Some(&idx) = active.get(&log_id) {
            let group = &mut groups[idx];
            if group.seq_hi + 1 == seq {
                group.seq_hi = seq;
                group.entries.push(queued);
                continue;
            }
        }
        groups.push(LogGroup { log_id: *log_id.as_bytes(), seq_lo: seq, seq_hi: seq, entries: vec![queued] });
        active.insert(log_id, groups.len() - 1);
    }
    groups
}
