/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors from the abstract [`crate::BlobStore`]/[`crate::KvStore`]
/// bindings.
///
/// Real bindings (object store, KV store) are out of scope (spec §1); this
/// covers only what the in-memory reference implementations can fail with
/// and the shape a real binding's errors would take at this boundary.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    /// No object exists at the given key.
    #[error("not found: {0}")]
    NotFound(String),
    /// A conditional write's precondition was not met (e.g. a key already
    /// exists when the caller required absence).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    /// The request-scoped deadline elapsed before the operation completed
    /// (spec §5 "Cancellation and timeouts").
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// An unclassified backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}
