/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors from `U64` arithmetic and MMR index math.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum Error {
    /// A `shl`/`shr` shift amount fell outside `[0, 63]`.
    #[error("shift amount {0} out of range [0, 63]")]
    OutOfRange(i64),
}
