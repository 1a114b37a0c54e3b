/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for MMR operations.
///
/// Covers store failures, proof corruption, invalid inputs, and merge
/// errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Tried to compute the root hash of an empty MMR.
    #[error("get root on an empty MMR")]
    GetRootOnEmpty,
    /// The backing store returned data inconsistent with the expected MMR
    /// structure.
    #[error("inconsistent store")]
    InconsistentStore,
    /// An error propagated from the underlying storage layer.
    #[error("store error: {0}")]
    StoreError(String),
    /// Tried to verify a proof for a non-leaf position.
    #[error("tried to verify membership of a non-leaf")]
    NodeProofsNotSupported,
    /// The leaf position list is empty or out of range.
    #[error("generate proof for invalid leaves")]
    GenProofForInvalidLeaves,
    /// A wrapped MMR operation failure.
    #[error("MMR operation failed: {0}")]
    OperationFailed(String),
    /// Invalid MMR data (deserialization, corruption).
    #[error("invalid MMR data: {0}")]
    InvalidData(String),
    /// Invalid input parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Invalid proof during verification.
    #[error("invalid proof: {0}")]
    InvalidProof(String),
}
