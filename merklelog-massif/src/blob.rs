//! The massif blob type: a byte buffer carrying the fixed-shape regions of
//! spec §3.3 plus an append region that backs a `merklelog_mmr::MMR` store.

use merklelog_mmr::{MMRStoreReadOps, MMRStoreWriteOps, MmrNode};

use crate::{
    Error, Result,
    layout::{APPEND_ENTRY_SIZE, LEAF_RECORD_SIZE, peak_stack_end, urkle_leaf_table_start_byte_offset},
    leaf::LeafRecord,
};

/// A massif blob: the fixed-shape header/index/frontier/leaf-table/peak-stack
/// regions, plus an append region of 32-byte MMR node values.
///
/// Implements [`MMRStoreReadOps`]/[`MMRStoreWriteOps`] over its append
/// region via `&MassifBlob`, so a `merklelog_mmr::MMR<&MassifBlob>` can push
/// leaves and generate proofs directly against it. The append region holds
/// bare node hashes (spec §3.3: "one 32-byte value per node") — the leaf
/// table holds the richer per-leaf record (idtimestamp, committed value,
/// extras) that `MmrNode`'s own serialization format does not need here.
#[derive(Debug, Clone)]
pub struct MassifBlob {
    massif_height: u8,
    buf: Vec<u8>,
}

impl MassifBlob {
    /// Create a fresh, empty massif blob of the given height: the fixed
    /// regions are present (zeroed) and the append region is empty.
    pub fn new(massif_height: u8) -> Self {
        let fixed_len = peak_stack_end(massif_height) as usize;
        MassifBlob {
            massif_height,
            buf: vec![0u8; fixed_len],
        }
    }

    /// Wrap existing bytes as a massif blob. Fails with
    /// [`Error::BlobTooShort`] if shorter than the fixed-region length, or
    /// if the append region is not a whole number of 32-byte entries.
    pub fn from_bytes(massif_height: u8, buf: Vec<u8>) -> Result<Self> {
        let want = peak_stack_end(massif_height);
        let got = buf.len() as u64;
        if got < want {
            return Err(Error::BlobTooShort { got, want });
        }
        if (got - want) % APPEND_ENTRY_SIZE != 0 {
            return Err(Error::BlobTooShort { got, want });
        }
        Ok(MassifBlob { massif_height, buf })
    }

    /// This massif's fixed height.
    pub fn massif_height(&self) -> u8 {
        self.massif_height
    }

    /// Total blob length in bytes.
    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    /// `true` if the blob carries only its fixed regions (no appended
    /// nodes yet).
    pub fn is_empty(&self) -> bool {
        self.buf.len() as u64 == peak_stack_end(self.massif_height)
    }

    /// Number of 32-byte append-region entries (spec invariant I1).
    pub fn log_entries(&self) -> u64 {
        crate::layout::massif_log_entries(self.len(), self.massif_height)
            .expect("blob was constructed with a valid length")
    }

    /// Maximum number of leaves this massif can hold: `2^(h - 1)`.
    pub fn leaf_capacity(&self) -> u64 {
        crate::layout::leaf_count_for_height(self.massif_height)
    }

    /// The raw bytes of this blob, for persisting to the object store.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume this blob, returning its raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Write a leaf record at the given zero-based leaf ordinal within this
    /// massif.
    ///
    /// Idempotent on `(ordinal, record)`: writing the same record at the
    /// same ordinal twice is a no-op. Writing a different record at an
    /// already-written ordinal fails with [`Error::LeafConflict`] (spec
    /// §4.5 failure model).
    pub fn write_leaf_record(&mut self, ordinal: u64, record: &LeafRecord) -> Result<()> {
        if ordinal >= self.leaf_capacity() {
            return Err(Error::InvalidLeafRecord(format!(
                "leaf ordinal {ordinal} exceeds massif capacity {}",
                self.leaf_capacity()
            )));
        }
        let offset = self.leaf_record_offset(ordinal);
        let encoded = record.encode();
        let slot = &mut self.buf[offset..offset + LEAF_RECORD_SIZE as usize];
        if slot.iter().all(|&b| b == 0) {
            slot.copy_from_slice(&encoded);
            return Ok(());
        }
        if slot == encoded {
            return Ok(());
        }
        Err(Error::LeafConflict { leaf_ordinal: ordinal })
    }

    /// Read the leaf record at the given zero-based leaf ordinal.
    pub fn read_leaf_record(&self, ordinal: u64) -> Result<LeafRecord> {
        let offset = self.leaf_record_offset(ordinal);
        LeafRecord::decode(&self.buf[offset..offset + LEAF_RECORD_SIZE as usize])
    }

    fn leaf_record_offset(&self, ordinal: u64) -> usize {
        (urkle_leaf_table_start_byte_offset(self.massif_height) + ordinal * LEAF_RECORD_SIZE)
            as usize
    }

    fn append_offset(&self, pos: u64) -> usize {
        (peak_stack_end(self.massif_height) + pos * APPEND_ENTRY_SIZE) as usize
    }
}

impl MMRStoreReadOps for &MassifBlob {
    fn element_at_position(&self, pos: u64) -> merklelog_mmr::Result<Option<MmrNode>> {
        let offset = self.append_offset(pos);
        let end = offset + APPEND_ENTRY_SIZE as usize;
        if end > self.buf.len() {
            return Ok(None);
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&self.buf[offset..end]);
        Ok(Some(MmrNode::internal(hash)))
    }
}

impl MMRStoreWriteOps for &mut MassifBlob {
    fn append(&mut self, pos: u64, elems: Vec<MmrNode>) -> merklelog_mmr::Result<()> {
        let start = self.append_offset(pos);
        let want_len = start + elems.len() * APPEND_ENTRY_SIZE as usize;
        if self.buf.len() < want_len {
            self.buf.resize(want_len, 0);
        }
        for (i, elem) in elems.into_iter().enumerate() {
            let offset = start + i * APPEND_ENTRY_SIZE as usize;
            self.buf[offset..offset + APPEND_ENTRY_SIZE as usize].copy_from_slice(&elem.hash());
        }
        Ok(())
    }
}
