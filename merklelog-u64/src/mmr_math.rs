//! Pure Merkle Mountain Range index arithmetic (spec §3.2, §4.1).
//!
//! Two numberings of one structure: `leafIndex` counts leaves only,
//! `mmrIndex` counts every node (leaves and interior). Every function here
//! is a pure transform between the two, or a derived quantity (height,
//! peak count, spur sum) with no I/O and no allocation.

/// Bit length of `x`: the position of its highest set bit, plus one.
/// `bitlen(0) == 0`.
fn bitlen(x: u64) -> u32 {
    64 - x.leading_zeros()
}

/// `true` if `x`'s binary representation is all ones (`2^k - 1` for some
/// `k >= 1`), i.e. `x` is itself a valid "last position" of a perfect
/// binary counter.
fn is_all_ones(x: u64) -> bool {
    x != 0 && x == (1u64 << bitlen(x)) - 1
}

/// Convert a zero-based leaf index to its zero-based MMR index.
///
/// Sums, while `current > 0`, the value `(1 << bitlen(current)) - 1`,
/// subtracting `1 << (bitlen(current) - 1)` from `current` at each step
/// (spec §3.2).
pub fn mmr_index(leaf_index: u64) -> u64 {
    let mut current = leaf_index;
    let mut sum = 0u64;
    while current > 0 {
        let bl = bitlen(current);
        sum = sum.wrapping_add((1u64 << bl) - 1);
        current -= 1u64 << (bl - 1);
    }
    sum
}

/// Alias of [`mmr_index`] under the name the spec's ack-path formulas use.
pub fn mmr_position(leaf_index: u64) -> u64 {
    mmr_index(leaf_index)
}

/// Alias of [`mmr_index`] under the name used when resolving the MMR index
/// of a leaf identified purely by its leaf-only ordinal.
pub fn mmr_index_from_leaf_index(leaf_index: u64) -> u64 {
    mmr_index(leaf_index)
}

/// One-based height of the node at `mmr_index` (spec §3.2: leaves have
/// height 1). See [`height_index`] for the zero-based variant used
/// internally by proof construction.
pub fn height(mmr_index: u64) -> u64 {
    let mut pos = mmr_index + 1;
    while !is_all_ones(pos) {
        let msb = 1u64 << (bitlen(pos) - 1);
        pos -= msb - 1;
    }
    (bitlen(pos) - 1 + 1) as u64
}

/// Zero-based height of the node at `mmr_index` (leaves have height 0).
pub fn height_index(mmr_index: u64) -> u64 {
    height(mmr_index) - 1
}

/// Number of leaves in a *complete* (single-peak) MMR of the given total
/// size: `(mmr_size + 1) / 2` (spec §3.2).
///
/// This closed form only holds at sizes that are themselves a complete
/// binary tree (`mmr_size == 2^k - 1`, one peak) — exactly the sizes a
/// sealed massif reaches. For an arbitrary (possibly multi-peak, partially
/// filled) size, use the peak-bitmap walk in `merklelog_mmr` instead.
pub fn leaf_count(mmr_size: u64) -> u64 {
    (mmr_size + 1) / 2
}

/// Number of leaves implied by a zero-based "height index" `hi`: `2^hi`.
pub fn leaf_count_from_height_index(height_index: u64) -> u64 {
    1u64 << height_index
}

/// The MMR size (leaves + interior nodes) of a perfect MMR holding exactly
/// `leaf_count_from_height_index(height_index)` leaves: `2 * leaves - 1`.
///
/// See `DESIGN.md` for why this definition was chosen: §4.1 names
/// `mmrSizeFromHeightIndex` without a worked example. A perfect MMR (one
/// whose leaf count is a power of two) always reduces to a single peak, so
/// its size is exactly twice its leaf count minus one.
pub fn mmr_size_from_height_index(height_index: u64) -> u64 {
    let leaves = leaf_count_from_height_index(height_index);
    2u64.wrapping_mul(leaves).wrapping_sub(1)
}

/// Starting from `leaf_index`, repeatedly subtract `leaf_index >> k` for
/// `k = 1, 2, …` until the shifted value is zero (spec §3.2). Equal to the
/// population count (number of set bits) of `leaf_index`, but implemented
/// as the literal running subtraction the spec describes.
pub fn leaf_minus_spur_sum(leaf_index: u64) -> u64 {
    let mut acc = leaf_index;
    let mut k = 1u32;
    loop {
        let spur = leaf_index >> k;
        if spur == 0 {
            break;
        }
        acc -= spur;
        k += 1;
    }
    acc
}

/// Number of leaves a massif of height `h` holds: `2^(h - 1)`.
///
/// `h` (`massifHeight`) is 1-based per spec §3.3 (`massifHeight ∈ [1, 64]`).
pub fn leaf_count_for_massif_height(massif_height: u8) -> u64 {
    1u64 << (massif_height - 1)
}

/// MMR index of the first leaf of massif `massif_index` at the given
/// massif height (spec §3.2):
/// `massifFirstLeaf(h, i) = mmrIndex(2^(h-1) * i)`.
pub fn massif_first_leaf(massif_height: u8, massif_index: u64) -> u64 {
    let leaves_per_massif = leaf_count_for_massif_height(massif_height);
    mmr_index(leaves_per_massif.wrapping_mul(massif_index))
}
