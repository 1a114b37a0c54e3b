//! Deterministic log-to-shard routing (spec §5.1).
//!
//! Deliberately non-cryptographic (djb2): do not replace the hash without
//! re-sharding all durable `pending` state, since a routing change moves a
//! log's ownership from one shard to another mid-flight.

use crate::LogId;

/// The djb2 string hash: `h = 5381; h = ((h << 5) + h + c) mod 2^32` for
/// each byte `c`.
pub fn djb2(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 5381;
    for &c in bytes {
        hash = hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(c as u32);
    }
    hash
}

/// The shard index a log is permanently routed to, given `shard_count`
/// (`N`) logical shards: `djb2(logIdUtf8) mod N`.
///
/// Routes the log's canonical hex string form through djb2, so per-log
/// entries always land on exactly one shard, preserving per-log ordering
/// (spec §5.1).
pub fn shard_index_for_log(log_id: &LogId, shard_count: u32) -> u32 {
    assert!(shard_count >= 1, "shard_count must be >= 1");
    djb2(log_id.to_string().as_bytes()) % shard_count
}

/// The canonical name of shard `i`: `shard-{i}`.
pub fn shard_name(index: u32) -> String {
    format!("shard-{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Spec §8 invariant 7.
    #[test]
    fn djb2_of_empty_string_is_5381() {
        assert_eq!(djb2(b""), 5381);
    }

    /// Spec §8 invariant 6.
    #[test]
    fn shard_index_is_in_range_and_stable() {
        let log_id = LogId::random();
        let first = shard_index_for_log(&log_id, 7);
        assert!(first < 7);
        for _ in 0..10 {
            assert_eq!(shard_index_for_log(&log_id, 7), first);
        }
    }

    /// Spec §8 scenario D: with shardCount=4 and 1,000 distinct logIds
    /// "log-000000".."log-000999", each shard receives > 150 and < 400
    /// logIds.
    ///
    /// The literal log id strings in the scenario aren't themselves valid
    /// `LogId` hex forms, so this test hashes the literal strings directly
    /// via `djb2`/`%`, matching spec §5.1's routing formula applied to
    /// whatever UTF-8 string identifies the log.
    #[test]
    fn scenario_d_sharding_distribution() {
        let shard_count = 4u32;
        let mut counts = [0u32; 4];
        for i in 0..1000 {
            let log_id = format!("log-{i:06}");
            let shard = djb2(log_id.as_bytes()) % shard_count;
            counts[shard as usize] += 1;
        }
        for count in counts {
            assert!(count > 150 && count < 400, "count = {count}");
        }
    }

    #[test]
    fn shard_name_format() {
        assert_eq!(shard_name(0), "shard-0");
        assert_eq!(shard_name(12), "shard-12");
    }
}
