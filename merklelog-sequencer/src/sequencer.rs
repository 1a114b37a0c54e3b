//! Sequencing a pulled batch into massif blobs (spec §4.5).

use merklelog_massif::{Checkpoint, LeafRecord, MassifBlob, checkpoint_path, massif_blob_path, parse_storage_path};
use merklelog_mmr::{MMR, MmrNode, mmr_size_to_leaf_count};
use merklelog_queue::dto::LogGroup;
use merklelog_storage::BlobStore;
use merklelog_u64::{leaf_count_for_massif_height, massif_first_leaf, mmr_index};

use crate::Result;

/// What the caller should ack back to the originating queue shard, once a
/// chunk of leaves has been durably written (spec §4.5 step 6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckCommand {
    /// The log these leaves belong to.
    pub log_id: [u8; 16],
    /// First shard-global `seq` in this chunk.
    pub seq_lo: u64,
    /// Number of entries committed in this chunk.
    pub limit: u32,
    /// The leaf index assigned to `seq_lo`.
    pub first_leaf_index: u64,
    /// The massif height in effect for this log.
    pub massif_height: u8,
}

/// A single entry dead-lettered mid-sequencing (spec §4.5, §7
/// `LeafConflict`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    /// The shard-global sequence number.
    pub seq: u64,
    /// Why the entry was dead-lettered.
    pub reason: String,
}

/// The result of sequencing one [`LogGroup`]: zero or more ack commands
/// (one per blob-boundary chunk, per spec §4.5's "partial batch progress"
/// requirement) and zero or more dead-letters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceOutcome {
    /// Chunks durably written and ready to ack.
    pub acks: Vec<AckCommand>,
    /// Entries that hit a `LeafConflict` and were abandoned.
    pub dead_letters: Vec<DeadLetter>,
}

/// Sequence one [`LogGroup`] against `store`, appending its entries into the
/// log's tail massif(s) at `massif_height`, sealing and rolling over on
/// capacity (spec §4.5 steps 1-6).
///
/// On a `LeafConflict` (spec §7), the conflicting entry is dead-lettered and
/// sequencing of this group stops: entries after the conflict are left
/// pending for a future pull, since their eventual leaf placement depends on
/// resolving the conflict first.
pub async fn sequence_group<B: BlobStore>(
    store: &B,
    group: &LogGroup,
    massif_height: u8,
) -> Result<SequenceOutcome> {
    let log_id_str = hex::encode(group.log_id);
    let mut massif_index = resolve_tail_index(store, &log_id_str, massif_height).await?;
    let leaf_capacity = leaf_count_for_massif_height(massif_height);

    let mut outcome = SequenceOutcome::default();
    let mut remaining: &[merklelog_queue::dto::QueuedEntry] = &group.entries;

    while !remaining.is_empty() {
        let key = massif_blob_path(&log_id_str, massif_height, massif_index);
        let mut blob = match store.get(&key).await? {
            Some(bytes) => MassifBlob::from_bytes(massif_height, bytes)?,
            None => MassifBlob::new(massif_height),
        };
        let leaves_in_tail = mmr_size_to_leaf_count(blob.log_entries());
        let available = leaf_capacity - leaves_in_tail;
        if available == 0 {
            // A stale tail pointer from a previous run that sealed but
            // never advanced; roll forward without consuming entries.
            massif_index += 1;
            continue;
        }

        // A re-pulled batch whose ack to the queue shard was lost after a
        // successful blob write re-presents the exact same entries (same
        // content per `seq`, which never changes once enqueued). Recognize
        // any leading run of `remaining` already durably sitting at the
        // tail of this massif's leaf table and re-ack it without writing
        // again, so it hits `write_leaf_record`'s no-op path at its
        // original offset instead of being appended a second time as a
        // brand-new, duplicate leaf (spec §4.5's idempotency contract).
        // This only looks within the current tail massif; recovering from
        // a lost ack that already spans into an earlier, sealed massif
        // would need a cross-massif scan this does not perform.
        let resumed = resumed_prefix_len(&blob, leaves_in_tail, remaining);
        if resumed > 0 {
            outcome.acks.push(AckCommand {
                log_id: group.log_id,
                seq_lo: remaining[0].seq,
                limit: resumed as u32,
                first_leaf_index: massif_first_leaf(massif_height, massif_index) + (leaves_in_tail - resumed),
                massif_height,
            });
            remaining = &remaining[resumed as usize..];
            if remaining.is_empty() {
                break;
            }
        }

        let take = available.min(remaining.len() as u64) as usize;
        let chunk = &remaining[..take];
        let chunk_first_leaf_index = massif_first_leaf(massif_height, massif_index) + leaves_in_tail;

        let mut committed = 0usize;
        let mut conflict = None;
        for (i, entry) in chunk.iter().enumerate() {
            let ordinal = leaves_in_tail + i as u64;
            let record = LeafRecord {
                idtimestamp: entry.id_timestamp,
                value_bytes: entry.content_hash,
                extra1: fit(extra_slot(entry, 0)),
                extra2: fit(extra_slot(entry, 1)),
                extra3: fit(extra_slot(entry, 2)),
            };
            match blob.write_leaf_record(ordinal, &record) {
                Ok(()) => committed = i + 1,
                Err(merklelog_massif::Error::LeafConflict { leaf_ordinal }) => {
                    conflict = Some(DeadLetter {
                        seq: entry.seq,
                        reason: format!("leaf conflict at ordinal {leaf_ordinal}"),
                    });
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if committed > 0 {
            let mmr_size = mmr_index(leaves_in_tail);
            let mut mmr = MMR::new(mmr_size, &mut blob);
            for entry in &chunk[..committed] {
                mmr.push(MmrNode::leaf(entry.content_hash.to_vec()))?;
            }
            mmr.commit()?;

            outcome.acks.push(AckCommand {
                log_id: group.log_id,
                seq_lo: chunk[0].seq,
                limit: committed as u32,
                first_leaf_index: chunk_first_leaf_index,
                massif_height,
            });
        }

        let sealed = leaves_in_tail + committed as u64 == leaf_capacity;
        if sealed {
            seal_checkpoint(store, &log_id_str, massif_height, massif_index, leaves_in_tail + committed as u64, &blob)
                .await;
        }

        store.put(&key, blob.into_bytes()).await?;

        if let Some(dead_letter) = conflict {
            outcome.dead_letters.push(dead_letter);
            break;
        }

        remaining = &remaining[take..];
        if sealed {
            massif_index += 1;
        }
    }

    Ok(outcome)
}

/// Length of the leading run of `remaining` already durably present at the
/// tail of `blob`'s leaf table (ordinals `leaves_in_tail - n ..
/// leaves_in_tail`), matched by content hash.
///
/// Walks candidate run lengths from the largest possible down to zero and
/// requires every position in a candidate window to match, so a genuine
/// content mismatch at the expected resume point is left for
/// `write_leaf_record` to reject as a `LeafConflict` rather than
/// masquerading as a shorter resume.
fn resumed_prefix_len(
    blob: &MassifBlob,
    leaves_in_tail: u64,
    remaining: &[merklelog_queue::dto::QueuedEntry],
) -> u64 {
    let max_candidate = leaves_in_tail.min(remaining.len() as u64);
    for candidate in (1..=max_candidate).rev() {
        let start = leaves_in_tail - candidate;
        let matches = (0..candidate).all(|i| {
            blob.read_leaf_record(start + i)
                .map(|record| record.value_bytes == remaining[i as usize].content_hash)
                .unwrap_or(false)
        });
        if matches {
            return candidate;
        }
    }
    0
}

/// Find the highest massif index already written for `log_id`, or `0` if
/// none exists yet.
async fn resolve_tail_index<B: BlobStore>(store: &B, log_id: &str, massif_height: u8) -> Result<u64> {
    let prefix = format!("v2/merklelog/massifs/{massif_height}/{log_id}/");
    let keys = store.list(&prefix).await?;
    let mut max_index: Option<u64> = None;
    for key in keys {
        if let Ok(parsed) = parse_storage_path(&key) {
            max_index = Some(max_index.map_or(parsed.massif_index, |m| m.max(parsed.massif_index)));
        }
    }
    Ok(max_index.unwrap_or(0))
}

/// Write a checkpoint after sealing a massif (SPEC_FULL §11). Best-effort:
/// a failure is logged, not propagated — the massif blob remains the
/// source of truth.
async fn seal_checkpoint<B: BlobStore>(
    store: &B,
    log_id: &str,
    massif_height: u8,
    massif_index: u64,
    leaf_count: u64,
    blob: &MassifBlob,
) {
    let final_size = mmr_index(leaf_count);
    let root = match MMR::new(final_size, blob).get_root() {
        Ok(root) => root,
        Err(e) => {
            tracing::warn!(log_id, massif_index, error = %e, "failed to compute checkpoint root");
            return;
        }
    };
    let checkpoint = Checkpoint {
        log_id: log_id.to_string(),
        massif_height,
        massif_index,
        root: root.hash(),
        leaf_count,
    };
    let bytes = match checkpoint.encode_to_vec() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(log_id, massif_index, error = %e, "failed to encode checkpoint");
            return;
        }
    };
    let key = checkpoint_path(log_id, massif_height, massif_index);
    if let Err(e) = store.put(&key, bytes).await {
        tracing::warn!(log_id, massif_index, error = %e, "failed to persist checkpoint");
    }
}

fn extra_slot(entry: &merklelog_queue::dto::QueuedEntry, index: usize) -> &[u8] {
    entry.extras.get(index).map(Vec::as_slice).unwrap_or(&[])
}

/// Copy up to `N` bytes of `bytes` into a zero-padded fixed array,
/// truncating anything longer.
fn fit<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let n = bytes.len().min(N);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use merklelog_storage::MemBlobStore;

    fn entry(seq: u64, content_hash: [u8; 32]) -> merklelog_queue::dto::QueuedEntry {
        merklelog_queue::dto::QueuedEntry { seq, content_hash, id_timestamp: seq, extras: vec![vec![], vec![], vec![], vec![]] }
    }

    /// Spec §8 scenario C: massifHeight=3 (capacity 4), 6 entries roll over
    /// into a second massif; `massifFirstLeaf(3, 1) = mmrIndex(4) = 7`.
    #[tokio::test]
    async fn capacity_rollover_spans_two_massifs() {
        let store = MemBlobStore::new();
        let log_id = [7u8; 16];
        let group = LogGroup {
            log_id,
            seq_lo: 0,
            seq_hi: 5,
            entries: (0..6u64).map(|i| entry(i, [i as u8; 32])).collect(),
        };

        let outcome = sequence_group(&store, &group, 3).await.unwrap();
        assert!(outcome.dead_letters.is_empty());
        assert_eq!(outcome.acks.len(), 2);
        assert_eq!(outcome.acks[0].seq_lo, 0);
        assert_eq!(outcome.acks[0].limit, 4);
        assert_eq!(outcome.acks[0].first_leaf_index, 0);
        assert_eq!(outcome.acks[1].seq_lo, 4);
        assert_eq!(outcome.acks[1].limit, 2);
        assert_eq!(outcome.acks[1].first_leaf_index, massif_first_leaf(3, 1));
        assert_eq!(massif_first_leaf(3, 1), mmr_index(4));

        let checkpoint_key = checkpoint_path(&hex::encode(log_id), 3, 0);
        assert!(store.get(&checkpoint_key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rewriting_identical_chunk_is_idempotent() {
        let store = MemBlobStore::new();
        let log_id = [1u8; 16];
        let group = LogGroup { log_id, seq_lo: 0, seq_hi: 0, entries: vec![entry(0, [9u8; 32])] };

        let first = sequence_group(&store, &group, 4).await.unwrap();
        assert_eq!(first.acks.len(), 1);
        assert_eq!(first.acks[0].first_leaf_index, 0);

        // Simulates the ack to the queue shard getting lost after the blob
        // write already succeeded: the entry stays pending and the exact
        // same group is re-pulled and handed back to the sequencer.
        let second = sequence_group(&store, &group, 4).await.unwrap();
        assert!(second.dead_letters.is_empty());
        assert_eq!(second.acks.len(), 1);
        assert_eq!(
            second.acks[0].first_leaf_index, 0,
            "replay must resolve back to the original offset, not append a new one"
        );

        let key = massif_blob_path(&hex::encode(log_id), 4, 0);
        let bytes = store.get(&key).await.unwrap().unwrap();
        let blob = MassifBlob::from_bytes(4, bytes).unwrap();
        assert_eq!(blob.log_entries(), 1, "replay must not append a duplicate physical leaf");
    }

    #[tokio::test]
    async fn conflicting_content_is_dead_lettered() {
        let store = MemBlobStore::new();
        let log_id = [2u8; 16];
        let log_id_hex = hex::encode(log_id);

        // Pre-seed the massif's leaf table at ordinal 0 with content that
        // will not match the entry the sequencer is about to place there.
        // This models a leaf-index assignment bug (or an administrative
        // reset) that collides two unrelated entries onto the same offset
        // -- not a genuine replay, since a replay always carries the same
        // content for the same `seq`.
        let mut seeded = MassifBlob::new(4);
        seeded
            .write_leaf_record(
                0,
                &LeafRecord {
                    idtimestamp: 0,
                    value_bytes: [1u8; 32],
                    extra1: [0u8; 24],
                    extra2: [0u8; 32],
                    extra3: [0u8; 32],
                },
            )
            .unwrap();
        store.put(&massif_blob_path(&log_id_hex, 4, 0), seeded.into_bytes()).await.unwrap();

        let group = LogGroup { log_id, seq_lo: 0, seq_hi: 0, entries: vec![entry(0, [2u8; 32])] };
        let outcome = sequence_group(&store, &group, 4).await.unwrap();
        assert_eq!(outcome.acks.len(), 0);
        assert_eq!(outcome.dead_letters.len(), 1);
        assert_eq!(outcome.dead_letters[0].seq, 0);
    }
}
