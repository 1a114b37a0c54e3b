//! 128-byte leaf record codec (spec §3.4).

use byteorder::{BigEndian, ByteOrder};

use crate::{Error, Result, layout::LEAF_RECORD_SIZE};

const IDTIMESTAMP_OFFSET: usize = 0;
const VALUE_OFFSET: usize = 8;
const VALUE_SIZE: usize = 32;
const EXTRA1_OFFSET: usize = 40;
const EXTRA1_SIZE: usize = 24;
const EXTRA2_OFFSET: usize = 64;
const EXTRA2_SIZE: usize = 32;
const EXTRA3_OFFSET: usize = 96;
const EXTRA3_SIZE: usize = 32;

/// One 128-byte leaf record: a big-endian `idtimestamp`, the 32-byte
/// committed value (the content hash), and three fixed-width extras.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafRecord {
    /// Big-endian, timestamp-sortable identifier assigned at enqueue time.
    pub idtimestamp: u64,
    /// The committed value — the 32-byte `ContentHash` of the sequenced
    /// statement.
    pub value_bytes: [u8; 32],
    /// First extra field (24 bytes).
    pub extra1: [u8; 24],
    /// Second extra field (32 bytes).
    pub extra2: [u8; 32],
    /// Third extra field (32 bytes).
    pub extra3: [u8; 32],
}

impl LeafRecord {
    /// Encode this record to its fixed 128-byte on-disk form.
    pub fn encode(&self) -> [u8; LEAF_RECORD_SIZE as usize] {
        let mut buf = [0u8; LEAF_RECORD_SIZE as usize];
        BigEndian::write_u64(
            &mut buf[IDTIMESTAMP_OFFSET..IDTIMESTAMP_OFFSET + 8],
            self.idtimestamp,
        );
        buf[VALUE_OFFSET..VALUE_OFFSET + VALUE_SIZE].copy_from_slice(&self.value_bytes);
        buf[EXTRA1_OFFSET..EXTRA1_OFFSET + EXTRA1_SIZE].copy_from_slice(&self.extra1);
        buf[EXTRA2_OFFSET..EXTRA2_OFFSET + EXTRA2_SIZE].copy_from_slice(&self.extra2);
        buf[EXTRA3_OFFSET..EXTRA3_OFFSET + EXTRA3_SIZE].copy_from_slice(&self.extra3);
        buf
    }

    /// Decode a 128-byte on-disk leaf record.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != LEAF_RECORD_SIZE as usize {
            return Err(Error::InvalidLeafRecord(format!(
                "expected {LEAF_RECORD_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let idtimestamp = BigEndian::read_u64(&bytes[IDTIMESTAMP_OFFSET..IDTIMESTAMP_OFFSET + 8]);
        let mut value_bytes = [0u8; VALUE_SIZE];
        value_bytes.copy_from_slice(&bytes[VALUE_OFFSET..VALUE_OFFSET + VALUE_SIZE]);
        let mut extra1 = [0u8; EXTRA1_SIZE];
        extra1.copy_from_slice(&bytes[EXTRA1_OFFSET..EXTRA1_OFFSET + EXTRA1_SIZE]);
        let mut extra2 = [0u8; EXTRA2_SIZE];
        extra2.copy_from_slice(&bytes[EXTRA2_OFFSET..EXTRA2_OFFSET + EXTRA2_SIZE]);
        let mut extra3 = [0u8; EXTRA3_SIZE];
        extra3.copy_from_slice(&bytes[EXTRA3_OFFSET..EXTRA3_OFFSET + EXTRA3_SIZE]);
        Ok(LeafRecord {
            idtimestamp,
            value_bytes,
            extra1,
            extra2,
            extra3,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LeafRecord {
        LeafRecord {
            idtimestamp: 0x0102_0304_0506_0708,
            value_bytes: [0xAA; 32],
            extra1: [0xBB; 24],
            extra2: [0xCC; 32],
            extra3: [0xDD; 32],
        }
    }

    #[test]
    fn round_trips() {
        let record = sample();
        let decoded = LeafRecord::decode(&record.encode()).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn idtimestamp_is_big_endian() {
        let record = sample();
        let encoded = record.encode();
        assert_eq!(&encoded[0..8], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(LeafRecord::decode(&[0u8; 127]).is_err());
        assert!(LeafRecord::decode(&[0u8; 129]).is_err());
    }
}
