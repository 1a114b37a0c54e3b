//! Bit-exact massif blob layout (spec §3.3, §4.2).
//!
//! Region order, fixed sizes aside, is: `StartHeader`, `IndexHeader`,
//! `BloomBitsets`, `FrontierState`, `LeafTable`, `PeakStack`. Everything
//! past `peak_stack_end` is the append region: one 32-byte MMR node value
//! per entry, in `mmrIndex` order.

use merklelog_u64::leaf_count_for_massif_height;

/// Fixed metadata slot at the head of every massif blob.
pub const START_HEADER_SIZE: u64 = 256;
/// Bloom index header, v1.
pub const INDEX_HEADER_SIZE: u64 = 32;
/// Urkle v1 frontier state. Opaque to this engine beyond its byte size.
pub const FRONTIER_STATE_SIZE: u64 = 544;
/// One leaf record (spec §3.4).
pub const LEAF_RECORD_SIZE: u64 = 128;
/// Upper bound on massif height; the peak stack is sized for this
/// regardless of the blob's actual height, so the append region's start
/// offset is O(1) to compute.
pub const MAX_MMR_HEIGHT: u64 = 64;
/// Fixed peak-stack region size: `MaxMmrHeight * 32`.
pub const PEAK_STACK_SIZE: u64 = MAX_MMR_HEIGHT * 32;
/// Width of one append-region entry: a bare 32-byte MMR node hash.
pub const APPEND_ENTRY_SIZE: u64 = 32;

/// Bits reserved per leaf in the bloom bitset, chosen for roughly 1% false
/// positive rate at the usual `k ~= 7` hash functions
/// (`-ln(p)/ln(2)^2 ~= 9.6` bits/item for `p = 0.01`, rounded up to 10).
/// Spec §3.3 leaves `mBits`'s derivation from `leafCount` unspecified; this
/// is the Open Question decision recorded in `DESIGN.md`.
const BLOOM_BITS_PER_LEAF: u64 = 10;

/// Number of leaves a massif of height `h` holds: `2^(h - 1)`.
///
/// `h` (`massifHeight`) is 1-based per spec §3.3 (`massifHeight ∈ [1, 64]`).
pub fn leaf_count_for_height(massif_height: u8) -> u64 {
    leaf_count_for_massif_height(massif_height)
}

/// Size in bytes of the `BloomBitsets` region for a massif holding
/// `leaf_count` leaves: `4 * ceil(mBits / 8)`.
pub fn index_data_bytes_v2(leaf_count: u64) -> u64 {
    let m_bits = leaf_count * BLOOM_BITS_PER_LEAF;
    4 * m_bits.div_ceil(8)
}

/// Byte offset of the first leaf record within the blob.
///
/// `256 + 32 + 4*ceil(mBits/8) + 544` (spec §4.2). The leaf table is
/// 32-byte aligned by construction.
pub fn urkle_leaf_table_start_byte_offset(massif_height: u8) -> u64 {
    START_HEADER_SIZE
        + INDEX_HEADER_SIZE
        + index_data_bytes_v2(leaf_count_for_height(massif_height))
        + FRONTIER_STATE_SIZE
}

/// Byte offset at which the fixed-shape region of the blob ends and the
/// append region (32-byte MMR node values) begins.
///
/// Spec §4.2 gives a one-line formula for `peakStackEnd` that omits the
/// `FrontierState` and `LeafTable` terms; §3.3's region table and the
/// `urkleLeafTableStartByteOffset` formula both require them, so this is
/// the sum of every fixed region: `urkleLeafTableStartByteOffset(h) +
/// leafCount(h)*128 + 2048`. See `DESIGN.md` for the Open Question
/// decision.
pub fn peak_stack_end(massif_height: u8) -> u64 {
    urkle_leaf_table_start_byte_offset(massif_height)
        + leaf_count_for_height(massif_height) * LEAF_RECORD_SIZE
        + PEAK_STACK_SIZE
}

/// Number of 32-byte append-region entries present in a blob of the given
/// total length (spec invariant I1).
///
/// Fails with [`crate::Error::BlobTooShort`] when `blob_len` is less than
/// [`peak_stack_end`].
pub fn massif_log_entries(blob_len: u64, massif_height: u8) -> crate::Result<u64> {
    let want = peak_stack_end(massif_height);
    if blob_len < want {
        return Err(crate::Error::BlobTooShort { got: blob_len, want });
    }
    Ok((blob_len - want) / APPEND_ENTRY_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn peak_stack_end_strictly_increasing() {
        let mut prev = peak_stack_end(1);
        for h in 2u8..=40 {
            let next = peak_stack_end(h);
            assert!(next > prev, "h={h}");
            prev = next;
        }
    }

    #[test]
    fn massif_log_entries_literal_invariants() {
        let h = 5u8;
        let end = peak_stack_end(h);
        assert_eq!(massif_log_entries(end, h).unwrap(), 0);
        assert_eq!(massif_log_entries(end + 3 * 32, h).unwrap(), 3);
        assert_eq!(
            massif_log_entries(end - 1, h),
            Err(Error::BlobTooShort { got: end - 1, want: end })
        );
    }

    #[test]
    fn index_data_bytes_is_a_multiple_of_four() {
        for h in 1u8..=30 {
            assert_eq!(index_data_bytes_v2(leaf_count_for_height(h)) % 4, 0, "h={h}");
        }
    }
}
