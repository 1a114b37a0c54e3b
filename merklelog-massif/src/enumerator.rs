//! Zero-copy leaf-table enumeration (spec §4.3).

use byteorder::{BigEndian, ByteOrder};

use crate::{
    Error, Result,
    layout::{LEAF_RECORD_SIZE, urkle_leaf_table_start_byte_offset},
};

/// Which leaf-record components a caller wants back from [`enumerate_leaves`].
///
/// Requesting fewer components lets the enumerator skip copying the ones
/// you don't need; the components you do request come back as non-owning
/// subviews into the caller's buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeafFields {
    /// Include the big-endian `idtimestamp`.
    pub idtimestamp: bool,
    /// Include the 32-byte committed value.
    pub value_bytes: bool,
    /// Include the first extra field.
    pub extra1: bool,
    /// Include the second extra field.
    pub extra2: bool,
    /// Include the third extra field.
    pub extra3: bool,
}

impl LeafFields {
    /// Request every component.
    pub fn all() -> Self {
        LeafFields {
            idtimestamp: true,
            value_bytes: true,
            extra1: true,
            extra2: true,
            extra3: true,
        }
    }
}

/// One enumerated leaf: only the components requested via [`LeafFields`]
/// are populated.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeafEntry<'a> {
    /// Zero-based leaf ordinal within the massif.
    pub ordinal: u64,
    /// The big-endian `idtimestamp`, if requested.
    pub idtimestamp: Option<u64>,
    /// The 32-byte committed value, if requested. Borrowed from the input
    /// buffer — no allocation.
    pub value_bytes: Option<&'a [u8]>,
    /// The first extra field, if requested.
    pub extra1: Option<&'a [u8]>,
    /// The second extra field, if requested.
    pub extra2: Option<&'a [u8]>,
    /// The third extra field, if requested.
    pub extra3: Option<&'a [u8]>,
}

/// Lazily enumerate `count` leaf records starting at leaf ordinal `start`
/// within `buf`, a byte view over a massif blob of the given height.
///
/// Yields only the components named in `fields`. Never allocates: every
/// requested component is a subslice of `buf`, except `idtimestamp` which
/// is read directly into a `u64` (it has no owning representation to avoid).
pub fn enumerate_leaves(
    buf: &[u8],
    massif_height: u8,
    start: u64,
    count: u64,
    fields: LeafFields,
) -> LeafEnumerator<'_> {
    LeafEnumerator {
        buf,
        table_start: urkle_leaf_table_start_byte_offset(massif_height),
        next: start,
        end: start + count,
        fields,
    }
}

/// Iterator returned by [`enumerate_leaves`].
pub struct LeafEnumerator<'a> {
    buf: &'a [u8],
    table_start: u64,
    next: u64,
    end: u64,
    fields: LeafFields,
}

impl<'a> Iterator for LeafEnumerator<'a> {
    type Item = Result<LeafEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let ordinal = self.next;
        self.next += 1;
        Some(read_leaf(self.buf, self.table_start, ordinal, self.fields))
    }
}

fn read_leaf(
    buf: &[u8],
    table_start: u64,
    ordinal: u64,
    fields: LeafFields,
) -> Result<LeafEntry<'_>> {
    let offset = (table_start + ordinal * LEAF_RECORD_SIZE) as usize;
    let record_end = offset + LEAF_RECORD_SIZE as usize;
    if buf.len() < record_end {
        return Err(Error::InvalidLeafRecord(format!(
            "leaf ordinal {ordinal} record [{offset}, {record_end}) exceeds buffer of length {}",
            buf.len()
        )));
    }
    let record = &buf[offset..record_end];
    Ok(LeafEntry {
        ordinal,
        idtimestamp: fields.idtimestamp.then(|| BigEndian::read_u64(&record[0..8])),
        value_bytes: fields.value_bytes.then(|| &record[8..40]),
        extra1: fields.extra1.then(|| &record[40..64]),
        extra2: fields.extra2.then(|| &record[64..96]),
        extra3: fields.extra3.then(|| &record[96..128]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::LeafRecord;

    fn blob_with_leaves(massif_height: u8, leaves: &[LeafRecord]) -> Vec<u8> {
        let start = urkle_leaf_table_start_byte_offset(massif_height) as usize;
        let mut buf = vec![0u8; start + leaves.len() * LEAF_RECORD_SIZE as usize];
        for (i, leaf) in leaves.iter().enumerate() {
            let off = start + i * LEAF_RECORD_SIZE as usize;
            buf[off..off + LEAF_RECORD_SIZE as usize].copy_from_slice(&leaf.encode());
        }
        buf
    }

    #[test]
    fn yields_requested_components_only() {
        let leaves = vec![LeafRecord {
            idtimestamp: 42,
            value_bytes: [1u8; 32],
            extra1: [2u8; 24],
            extra2: [3u8; 32],
            extra3: [4u8; 32],
        }];
        let buf = blob_with_leaves(3, &leaves);
        let fields = LeafFields {
            idtimestamp: true,
            value_bytes: true,
            ..Default::default()
        };
        let mut iter = enumerate_leaves(&buf, 3, 0, 1, fields);
        let entry = iter.next().unwrap().unwrap();
        assert_eq!(entry.idtimestamp, Some(42));
        assert_eq!(entry.value_bytes, Some([1u8; 32].as_slice()));
        assert!(entry.extra1.is_none());
        assert!(entry.extra2.is_none());
        assert!(entry.extra3.is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn matches_direct_byte_read() {
        let leaves: Vec<_> = (0..4u64)
            .map(|i| LeafRecord {
                idtimestamp: i,
                value_bytes: [i as u8; 32],
                extra1: [0u8; 24],
                extra2: [0u8; 32],
                extra3: [0u8; 32],
            })
            .collect();
        let buf = blob_with_leaves(4, &leaves);
        let table_start = urkle_leaf_table_start_byte_offset(4);
        for entry in enumerate_leaves(&buf, 4, 1, 2, LeafFields::all()) {
            let entry = entry.unwrap();
            let off = (table_start + entry.ordinal * LEAF_RECORD_SIZE) as usize;
            assert_eq!(
                entry.value_bytes.unwrap(),
                &buf[off + 8..off + 40],
                "ordinal {}",
                entry.ordinal
            );
        }
    }

    #[test]
    fn out_of_range_fails() {
        let buf = blob_with_leaves(3, &[]);
        let mut iter = enumerate_leaves(&buf, 3, 0, 1, LeafFields::all());
        assert!(iter.next().unwrap().is_err());
    }
}
