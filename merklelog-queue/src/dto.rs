//! CBOR wire DTOs for the queue HTTP surface (spec §6.1).
//!
//! These are the serializable request/response shapes that travel over
//! `application/cbor`; the shard state machine itself works in terms of
//! the richer domain types in `entry`/`scalars` and is transport-agnostic.

use serde::{Deserialize, Serialize};

use crate::{ContentHash, LogId};

/// `POST /queue/pull?shard={i}` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    /// Identifies the caller for lease ownership.
    pub poller_id: String,
    /// Maximum number of entries to pull.
    pub batch_size: u32,
    /// Lease visibility window, in milliseconds.
    pub visibility_ms: u32,
}

/// `POST /queue/pull?shard={i}` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    /// Wire format version, currently always 1.
    pub version: u8,
    /// `max(expiresAt)` across entries returned, or `now()` if empty.
    pub lease_expiry: u64,
    /// Entries grouped by contiguous per-log seq ranges.
    pub log_groups: Vec<LogGroup>,
}

/// One contiguous per-log seq range within a pull response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroup {
    /// The log these entries belong to.
    pub log_id: [u8; 16],
    /// First seq in this group (inclusive).
    pub seq_lo: u64,
    /// Last seq in this group (inclusive).
    pub seq_hi: u64,
    /// Entries, ordered by `seq` ascending.
    pub entries: Vec<QueuedEntry>,
}

/// One queued entry as it appears in a [`LogGroup`].
///
/// Carries `idTimestamp` alongside `contentHash`/`extras` even though spec
/// §8 scenario A's literal example omits it from the pulled shape: the
/// sequencer's leaf record (spec §3.4) has an `idtimestamp` field, and the
/// queue is the only place that value is assigned (at enqueue time), so it
/// must travel to the sequencer somehow. Recorded as an Open Question
/// decision in `DESIGN.md`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedEntry {
    /// The shard-global sequence number.
    pub seq: u64,
    /// The content hash of the signed statement.
    pub content_hash: [u8; 32],
    /// Timestamp-sortable identifier assigned at enqueue time.
    pub id_timestamp: u64,
    /// Fixed extra byte-string slots.
    pub extras: Vec<Vec<u8>>,
}

/// `POST /queue/ack?shard={i}` request body.
///
/// The spec's literal ack schema omits a caller identity field, but
/// `NotLeasedByCaller` (spec §7) is only checkable given one; `poller_id`
/// is the necessary addition recorded in `DESIGN.md`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckRequest {
    /// The log whose entries are being acked.
    pub log_id: [u8; 16],
    /// First seq in the range to ack (inclusive).
    pub seq_lo: u64,
    /// Number of entries to ack.
    pub limit: u32,
    /// The leaf index assigned to the first acked entry.
    pub first_leaf_index: u64,
    /// The massif height in effect for this log.
    pub massif_height: u8,
    /// Caller identity, for lease-ownership verification.
    pub poller_id: String,
}

/// `POST /queue/ack?shard={i}` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AckResponse {
    /// Number of entries actually acked (idempotent: 0 on a repeat).
    pub acked: u32,
}

/// `GET /queue/stats` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    /// Current pending-entry count.
    pub pending: u64,
    /// Current dead-letter count.
    pub dead_letters: u64,
    /// Age of the oldest pending entry, in milliseconds, if any.
    pub oldest_entry_age_ms: Option<u64>,
    /// Count of pollers currently holding an unexpired lease.
    pub active_pollers: u64,
    /// `true` if `MAX_POLLERS` is currently saturated.
    pub poller_limit_reached: bool,
}

/// One entry of `GET /queue/shards`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardInfo {
    /// The shard's index.
    pub index: u32,
    /// The shard's current pending-entry count.
    pub pending_count: u64,
}

/// `GET /queue/shards` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardsResponse {
    /// Total shard count (`N`).
    pub count: u32,
    /// URL template for `pull`, with a `{shard}` placeholder.
    pub pull_url_template: String,
    /// URL template for `ack`, with a `{shard}` placeholder.
    pub ack_url_template: String,
    /// Per-shard summaries.
    pub shards: Vec<ShardInfo>,
}

/// `latencySummary` in `GET /queue/debug/recent`: percentiles use ceil
/// index on sorted samples.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LatencySummary {
    /// Number of samples the summary was computed from.
    pub count: u64,
    /// Minimum latency, in milliseconds.
    pub min_ms: u64,
    /// Maximum latency, in milliseconds.
    pub max_ms: u64,
    /// Mean latency, in milliseconds (floor-divided).
    pub avg_ms: u64,
    /// 50th percentile latency.
    pub p50_ms: u64,
    /// 95th percentile latency.
    pub p95_ms: u64,
    /// 99th percentile latency.
    pub p99_ms: u64,
}

impl LatencySummary {
    /// Compute a latency summary from a slice of millisecond samples.
    /// Returns `None` for an empty slice.
    pub fn from_samples(samples: &[u64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_unstable();
        let count = sorted.len() as u64;
        let sum: u64 = sorted.iter().sum();
        let percentile = |p: u64| -> u64 {
            // ceil index on sorted samples, 1-based, clamped to the last
            // element.
            let idx = (sorted.len() as u64 * p).div_ceil(100).max(1);
            let idx = idx.min(sorted.len() as u64) - 1;
            sorted[idx as usize]
        };
        Some(LatencySummary {
            count,
            min_ms: sorted[0],
            max_ms: sorted[sorted.len() - 1],
            avg_ms: sum / count,
            p50_ms: percentile(50),
            p95_ms: percentile(95),
            p99_ms: percentile(99),
        })
    }
}

/// A queued entry's observability view (`GET /queue/debug/recent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEntryView {
    /// The shard-global sequence number.
    pub seq: u64,
    /// The log this entry belonged to.
    pub log_id: LogId,
    /// The content hash of the signed statement.
    pub content_hash: ContentHash,
    /// Wall-clock milliseconds at enqueue time.
    pub enqueued_at_ms: u64,
    /// Wall-clock milliseconds at ack time, if acked.
    pub acked_at_ms: Option<u64>,
    /// `ackedAt - enqueuedAt`, once acked.
    pub sequencing_latency_ms: Option<u64>,
}

/// RFC 9457 Problem Details, CBOR-encoded (spec §6.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// A URI identifying the problem type.
    #[serde(rename = "type")]
    pub kind: String,
    /// A short, human-readable summary.
    pub title: String,
    /// The HTTP status code.
    pub status: u16,
    /// An optional human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_summary_percentiles_use_ceil_index() {
        let samples: Vec<u64> = (1..=100).collect();
        let summary = LatencySummary::from_samples(&samples).unwrap();
        assert_eq!(summary.count, 100);
        assert_eq!(summary.min_ms, 1);
        assert_eq!(summary.max_ms, 100);
        assert_eq!(summary.p50_ms, 50);
        assert_eq!(summary.p95_ms, 95);
        assert_eq!(summary.p99_ms, 99);
    }

    #[test]
    fn latency_summary_of_empty_is_none() {
        assert!(LatencySummary::from_samples(&[]).is_none());
    }

    #[test]
    fn problem_details_round_trips_through_cbor() {
        let problem = ProblemDetails {
            kind: "https://example/queue-full".to_string(),
            title: "Queue full".to_string(),
            status: 503,
            detail: Some("pending 1/1".to_string()),
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&problem, &mut buf).unwrap();
        let decoded: ProblemDetails = ciborium::from_reader(buf.as_slice()).unwrap();
        assert_eq!(decoded.status, 503);
        assert_eq!(decoded.kind, problem.kind);
    }
}
