//! Environment-derived queue knobs (spec §6.4).
//!
//! The spec names `QUEUE_SHARD_COUNT`, `MAX_PENDING`, and `MAX_POLLERS` but
//! gives none of them a numeric default; the values below are this
//! implementation's choice, recorded in `DESIGN.md`.

use std::env;

/// Default shard count when `QUEUE_SHARD_COUNT` is unset or unparsable.
pub const DEFAULT_SHARD_COUNT: u32 = 1;
/// Default `MAX_PENDING` per shard.
pub const DEFAULT_MAX_PENDING: u64 = 100_000;
/// Default `MAX_POLLERS` per shard.
pub const DEFAULT_MAX_POLLERS: u32 = 16;
/// Default bound on the `recent` observability ring, per shard.
pub const DEFAULT_RECENT_CAPACITY: usize = 1_000;

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(name, raw, "failed to parse env var, using default");
            default
        }),
        Err(_) => default,
    }
}

/// `QUEUE_SHARD_COUNT`, defaulting to [`DEFAULT_SHARD_COUNT`].
pub fn shard_count() -> u32 {
    parse_env("QUEUE_SHARD_COUNT", DEFAULT_SHARD_COUNT).max(1)
}

/// `MAX_PENDING`, defaulting to [`DEFAULT_MAX_PENDING`].
pub fn max_pending() -> u64 {
    parse_env("MAX_PENDING", DEFAULT_MAX_PENDING)
}

/// `MAX_POLLERS`, defaulting to [`DEFAULT_MAX_POLLERS`].
pub fn max_pollers() -> u32 {
    parse_env("MAX_POLLERS", DEFAULT_MAX_POLLERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_missing_var() {
        assert_eq!(parse_env::<u32>("MERKLELOG_QUEUE_TEST_UNSET_VAR", 7), 7);
    }
}
