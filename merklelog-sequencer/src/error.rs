/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Sequencer error kinds (spec §4.5, §7).
///
/// `LeafConflict` is deliberately not one of these variants: it is not a
/// propagated failure but a per-entry outcome the sequencer handles inline
/// (dead-lettering the conflicting entry and continuing), per the failure
/// model in spec §4.5.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A massif blob layout or leaf-record failure other than
    /// `LeafConflict`.
    #[error(transparent)]
    Massif(#[from] merklelog_massif::Error),
    /// An MMR push/commit/proof failure.
    #[error(transparent)]
    Mmr(#[from] merklelog_mmr::Error),
    /// An object-store read/write failure.
    #[error(transparent)]
    Storage(#[from] merklelog_storage::Error),
}
