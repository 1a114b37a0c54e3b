/// Alias for `core::result::Result<T, EngineError>`.
pub type Result<T> = core::result::Result<T, EngineError>;

/// Composes the per-crate errors into one top-level type, the way a top
/// orchestrator crate re-exports its dependencies' errors without
/// duplicating their variants (spec §7; `SPEC_FULL.md` §10.1).
///
/// HTTP status mapping for these lives on the `http` feature's transport
/// boundary, not here — this type stays meaningful without that feature.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// A queue operation failed (spec §7 `InvalidRequest`, `QueueFull`,
    /// `NotLeasedByCaller`, `PollerLimitReached`).
    #[error(transparent)]
    Queue(#[from] merklelog_queue::Error),
    /// The sequencer failed to turn a pulled batch into massif bytes.
    #[error(transparent)]
    Sequencer(#[from] merklelog_sequencer::Error),
    /// The per-log cache failed during `ingest` (never during `resolve`,
    /// which swallows its own failures per §7).
    #[error(transparent)]
    Cache(#[from] merklelog_cache::Error),
    /// The backing object or key/value store failed.
    #[error(transparent)]
    Storage(#[from] merklelog_storage::Error),
}
