//! Internal MMR position arithmetic used by proof construction.
//!
//! `merklelog-u64` owns the spec-named leaf/MMR index conversions
//! (`mmr_index`, `height`, …) used by the massif layout and sequencer. This
//! module carries the complementary bit-trick helpers that only the proof
//! walker needs: peak enumeration and sibling/parent offsets expressed in
//! zero-based tree height.

/// Returns the height of the subtree rooted at `pos` in the MMR.
///
/// Leaf positions have height 0; internal nodes have height > 0.
pub fn pos_height_in_tree(mut pos: u64) -> u8 {
    if pos == 0 {
        return 0;
    }

    let mut peak_size = u64::MAX >> pos.leading_zeros();
    while peak_size > 0 {
        if pos >= peak_size {
            pos -= peak_size;
        }
        peak_size >>= 1;
    }
    pos as u8
}

/// Offset from a node to its parent at the given height.
pub fn parent_offset(height: u8) -> u64 {
    2 << height
}

/// Offset from a node to its sibling at the given height.
pub fn sibling_offset(height: u8) -> u64 {
    (2 << height) - 1
}

/// Returns the height of the peaks in the mmr, presented by a bitmap.
///
/// For example, a mmr with 11 leaves has mmr_size 19, and returns `0b1011`:
/// peaks at height 0, 1 and 3.
/// ```text
///           14
///        /       \
///      6          13
///    /   \       /   \
///   2     5     9     12     17
///  / \   /  \  / \   /  \   /  \
/// 0   1 3   4 7   8 10  11 15  16 18
/// ```
pub fn get_peak_map(mmr_size: u64) -> u64 {
    if mmr_size == 0 {
        return 0;
    }

    let mut pos = mmr_size;
    let mut peak_size = u64::MAX >> pos.leading_zeros();
    let mut peak_map = 0;
    while peak_size > 0 {
        peak_map <<= 1;
        if pos >= peak_size {
            pos -= peak_size;
            peak_map |= 1;
        }
        peak_size >>= 1;
    }

    peak_map
}

/// Returns the positions of the peaks in the mmr.
///
/// For example, a mmr with 11 leaves has mmr_size 19, and returns
/// `[14, 17, 18]` (see the diagram on [`get_peak_map`]).
pub fn get_peaks(mmr_size: u64) -> Vec<u64> {
    if mmr_size == 0 {
        return vec![];
    }

    let leading_zeros = mmr_size.leading_zeros();
    let mut pos = mmr_size;
    let mut peak_size = u64::MAX >> leading_zeros;
    let mut peaks = Vec::with_capacity(64 - leading_zeros as usize);
    let mut peaks_sum = 0;
    while peak_size > 0 {
        if pos >= peak_size {
            pos -= peak_size;
            peaks.push(peaks_sum + peak_size - 1);
            peaks_sum += peak_size;
        }
        peak_size >>= 1;
    }
    peaks
}

/// Compute the MMR size after inserting `index + 1` leaves.
///
/// Overflows when `index >= 2^63 - 1` because `2 * leaves_count` exceeds
/// `u64::MAX`. Callers must validate indices before calling.
pub fn leaf_index_to_mmr_size(index: u64) -> u64 {
    let leaves_count = index + 1;
    let peak_count = leaves_count.count_ones() as u64;
    2 * leaves_count - peak_count
}

/// Derive the number of leaves from an arbitrary (possibly partial) MMR
/// size.
///
/// The peak map bitmap encodes one bit per peak at height `h`, so its
/// numeric value equals the total leaf count: `sum(2^h)` for each set bit
/// `h`. Unlike `merklelog_u64::leaf_count`, this holds for every valid
/// `mmr_size`, not only the single-peak (`2^k - 1`) ones.
pub fn mmr_size_to_leaf_count(mmr_size: u64) -> u64 {
    get_peak_map(mmr_size)
}
