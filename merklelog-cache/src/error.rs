/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Cache error kinds (spec §4.6, §7).
///
/// Per §7's propagation policy, none of these ever escape `resolve` — lookup
/// failures are logged and answered with `None`. They can escape `ingest`,
/// since a failed ingest means the index genuinely wasn't updated.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A leaf record's committed value was not exactly 32 bytes.
    #[error("malformed content hash: expected 32 bytes, got {0}")]
    MalformedContentHash(usize),
    /// The underlying massif blob could not be enumerated.
    #[error(transparent)]
    Massif(#[from] merklelog_massif::Error),
    /// The backing key/value store failed.
    #[error(transparent)]
    Storage(#[from] merklelog_storage::Error),
    /// A stored index row failed to decode.
    #[error("corrupt index row: {0}")]
    CorruptRow(String),
}
