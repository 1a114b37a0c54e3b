//! Property tests for the literal invariants spec §8 lists for MMR math.

use merklelog_u64::{height, leaf_count_for_massif_height, massif_first_leaf, mmr_index};
use proptest::prelude::*;

proptest! {
    /// Invariant 2: massifFirstLeaf(h, i+1) > massifFirstLeaf(h, i).
    #[test]
    fn massif_first_leaf_strictly_increasing(h in 1u8..=20, i in 0u64..5000) {
        prop_assert!(massif_first_leaf(h, i + 1) > massif_first_leaf(h, i));
    }

    /// Every leaf's mmr_index has height 1, regardless of how it was reached.
    #[test]
    fn leaves_always_have_height_one(leaf_index in 0u64..100_000) {
        prop_assert_eq!(height(mmr_index(leaf_index)), 1);
    }

    /// mmr_index is strictly increasing in leaf_index.
    #[test]
    fn mmr_index_strictly_increasing(a in 0u64..10_000, b in 0u64..10_000) {
        if a < b {
            prop_assert!(mmr_index(a) < mmr_index(b));
        }
    }

    /// leaf_count_for_massif_height is always a power of two.
    #[test]
    fn massif_leaf_count_is_power_of_two(h in 1u8..=64) {
        prop_assert!(leaf_count_for_massif_height(h).is_power_of_two());
    }
}
