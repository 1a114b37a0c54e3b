/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors from massif blob layout, storage-path parsing, and the leaf
/// record codec.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A blob was shorter than `peakStackEnd(massifHeight)` (spec §4.2).
    #[error("blob too short: got {got} bytes, need at least {want}")]
    BlobTooShort {
        /// Actual blob length in bytes.
        got: u64,
        /// Minimum required length, `peakStackEnd(massifHeight)`.
        want: u64,
    },
    /// A storage path did not match the bit-exact `v2/merklelog/...` shape
    /// (spec §3.5, §4.2). The string names the precise reason.
    #[error("unrecognized storage path: {0}")]
    UnrecognizedPath(String),
    /// A hex string was not valid (wrong length or non-hex characters).
    #[error("bad hex: {0}")]
    BadHex(String),
    /// A leaf record slot already holds a different committed value than
    /// the one being written (spec §4.5 failure model).
    #[error("leaf conflict at ordinal {leaf_ordinal}: already committed a different value")]
    LeafConflict {
        /// The zero-based leaf ordinal within the massif that conflicted.
        leaf_ordinal: u64,
    },
    /// A leaf record's fixed-width fields did not decode cleanly.
    #[error("invalid leaf record: {0}")]
    InvalidLeafRecord(String),
    /// A checkpoint blob failed to encode or decode as CBOR.
    #[error("invalid checkpoint: {0}")]
    InvalidCheckpoint(String),
}
