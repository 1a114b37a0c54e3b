//! Checkpoint blob payload (spec §3.5's `.sth` path; payload added per
//! `SPEC_FULL.md` §11 "Checkpoint blobs").

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A "Sealed Tree Head"-shaped checkpoint, written by the sequencer
/// immediately after sealing a massif.
///
/// Checkpoint writes are best-effort: the massif blob itself remains the
/// source of truth, so a checkpoint write failure is logged by the caller
/// and does not fail the seal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The log this checkpoint belongs to.
    pub log_id: String,
    /// The sealed massif's height.
    pub massif_height: u8,
    /// The sealed massif's index.
    pub massif_index: u64,
    /// The MMR root at the moment of sealing.
    pub root: [u8; 32],
    /// Number of leaves committed in the sealed massif.
    pub leaf_count: u64,
}

impl Checkpoint {
    /// CBOR-encode this checkpoint.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| Error::InvalidCheckpoint(e.to_string()))?;
        Ok(buf)
    }

    /// Decode a CBOR-encoded checkpoint.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| Error::InvalidCheckpoint(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_cbor() {
        let checkpoint = Checkpoint {
            log_id: "my-log".to_string(),
            massif_height: 3,
            massif_index: 1,
            root: [9u8; 32],
            leaf_count: 4,
        };
        let bytes = checkpoint.encode_to_vec().unwrap();
        assert_eq!(Checkpoint::decode_from_slice(&bytes).unwrap(), checkpoint);
    }
}
