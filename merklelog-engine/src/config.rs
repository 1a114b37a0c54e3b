//! Process configuration from the environment (spec §6.4, `SPEC_FULL.md`
//! §10.3).

use merklelog_queue::env;

/// The three knobs spec §6.4 names, resolved once at process start.
///
/// Each is parsed with `std::env::var` + `str::parse`; a missing or
/// unparsable value is logged via `tracing::warn!` and replaced with its
/// documented default (`merklelog_queue::env`'s `DEFAULT_*` constants). No
/// config-file crate is introduced for a three-integer surface.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// `QUEUE_SHARD_COUNT`.
    pub shard_count: u32,
    /// `MAX_PENDING`, per shard.
    pub max_pending: u64,
    /// `MAX_POLLERS`, per shard.
    pub max_pollers: u32,
}

impl EngineConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        EngineConfig {
            shard_count: env::shard_count(),
            max_pending: env::max_pending(),
            max_pollers: env::max_pollers(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            shard_count: env::DEFAULT_SHARD_COUNT,
            max_pending: env::DEFAULT_MAX_PENDING,
            max_pollers: env::DEFAULT_MAX_POLLERS,
        }
    }
}

/// Install a `tracing-subscriber` formatting layer driven by `RUST_LOG`
/// (`SPEC_FULL.md` §10.2). Idempotent-ish: a second call after the global
/// subscriber is already set is a no-op (the error is discarded).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.shard_count, 1);
        assert_eq!(config.max_pending, 100_000);
        assert_eq!(config.max_pollers, 16);
    }
}
