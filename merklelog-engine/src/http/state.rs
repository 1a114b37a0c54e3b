//! Shared state behind the `http` feature's router (spec §6.1).

use std::sync::Arc;

use merklelog_queue::Shard;
use tokio::sync::Mutex;

use crate::config::EngineConfig;

/// One process's queue, gated behind the `http` feature: `shard_count`
/// independent [`Shard`]s, each its own single-writer state machine behind
/// its own lock (spec §9 "Sharing via durable single-writer" — no
/// cross-shard lock is ever held at once).
pub struct EngineState {
    pub(crate) shards: Vec<Mutex<Shard>>,
    pub(crate) config: EngineConfig,
}

impl EngineState {
    /// Build a fresh, empty queue of `config.shard_count` shards.
    pub fn new(config: EngineConfig) -> Arc<Self> {
        let shards = (0..config.shard_count)
            .map(|_| Mutex::new(Shard::new(config.max_pending, config.max_pollers, 1_000)))
            .collect();
        Arc::new(EngineState { shards, config })
    }

    pub(crate) fn shard(&self, index: u32) -> Option<&Mutex<Shard>> {
        self.shards.get(index as usize)
    }
}

/// Wall-clock milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis() as u64
}
