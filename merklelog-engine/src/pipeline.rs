//! End-to-end dataflow helper (`SPEC_FULL.md` §11), threading one statement
//! through enqueue -> pull -> sequence -> ack.
//!
//! Doubles as living documentation of the §2 system overview's dataflow and
//! is exercised by the workspace's integration tests; it is not part of the
//! abstract external interface (§6).

use merklelog_queue::dto::{AckRequest, PullRequest};
use merklelog_queue::{ContentHash, LogId, Shard};
use merklelog_sequencer::{SequenceOutcome, sequence_group};
use merklelog_storage::BlobStore;

use crate::Result;

/// Enqueue one statement onto `shard`, pull it straight back off, sequence
/// it into `store`, and ack the result — all in one call, against whatever
/// `now_ms` the caller supplies.
///
/// Returns the [`SequenceOutcome`] the sequencer produced (acks and
/// dead-letters), after having already replayed its acks against `shard`.
pub async fn ingest_and_drain<B: BlobStore>(
    shard: &mut Shard,
    store: &B,
    log_id: LogId,
    content_hash: ContentHash,
    massif_height: u8,
    now_ms: u64,
) -> Result<SequenceOutcome> {
    let extras: merklelog_queue::Extras = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
    shard.enqueue(log_id, content_hash, extras, now_ms)?;

    let pulled = shard.pull(
        PullRequest {
            poller_id: "pipeline".to_string(),
            batch_size: 1,
            visibility_ms: 60_000,
        },
        now_ms,
    )?;

    let mut outcome = SequenceOutcome::default();
    for group in &pulled.log_groups {
        let group_outcome = sequence_group(store, group, massif_height).await?;

        for ack in &group_outcome.acks {
            shard.ack(
                AckRequest {
                    log_id: ack.log_id,
                    seq_lo: ack.seq_lo,
                    limit: ack.limit,
                    first_leaf_index: ack.first_leaf_index,
                    massif_height: ack.massif_height,
                    poller_id: "pipeline".to_string(),
                },
                now_ms,
            )?;
        }
        for dead_letter in &group_outcome.dead_letters {
            shard.record_dead_letter(dead_letter.seq, dead_letter.reason.clone(), now_ms);
        }

        outcome.acks.extend(group_outcome.acks);
        outcome.dead_letters.extend(group_outcome.dead_letters);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use merklelog_storage::MemBlobStore;

    #[tokio::test]
    async fn one_statement_round_trips_to_a_sequenced_leaf() {
        let mut shard = Shard::new(100, 4, 16);
        let store = MemBlobStore::new();
        let log_id = LogId::random();
        let content_hash = ContentHash::new([9u8; 32]);

        let outcome = ingest_and_drain(&mut shard, &store, log_id, content_hash, 4, 1_000)
            .await
            .unwrap();

        assert_eq!(outcome.acks.len(), 1);
        assert_eq!(outcome.acks[0].first_leaf_index, 0);
        assert!(outcome.dead_letters.is_empty());
        assert_eq!(shard.pending_count(), 0);

        let recent = shard.recent_entries(10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].leaf_index, Some(0));
        assert_eq!(recent[0].massif_index, Some(0));
    }
}
