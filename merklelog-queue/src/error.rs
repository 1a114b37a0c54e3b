/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Queue error kinds (spec §7). HTTP status mapping lives on the transport
/// boundary (`merklelog-engine`), not here — the queue itself is
/// transport-agnostic.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A request carried a bad shard, or a missing/mistyped field.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// `enqueue` was rejected because `|pending| >= MAX_PENDING`.
    #[error("queue full: {pending_count}/{max_pending} pending")]
    QueueFull {
        /// Current pending-entry count.
        pending_count: u64,
        /// The configured `MAX_PENDING` bound.
        max_pending: u64,
        /// Suggested `Retry-After` seconds, derived from fill ratio.
        retry_after_seconds: u32,
    },
    /// `ack` was attempted on seqs the caller does not hold a lease on.
    #[error("not leased by caller")]
    NotLeasedByCaller,
    /// A new poller was rejected because `MAX_POLLERS` distinct pollers
    /// already hold leases.
    #[error("poller limit reached")]
    PollerLimitReached,
    /// An unclassified internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}
