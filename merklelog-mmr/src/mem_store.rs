use std::{cell::RefCell, collections::BTreeMap};

use crate::{MMRStoreReadOps, MMRStoreWriteOps, MmrNode, Result};

/// In-memory MMR store backed by a `BTreeMap`.
///
/// Useful for tests and ephemeral computations.
#[derive(Clone)]
pub struct MemStore(RefCell<BTreeMap<u64, MmrNode>>);

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    fn new() -> Self {
        MemStore(RefCell::new(Default::default()))
    }
}

impl MMRStoreReadOps for &MemStore {
    fn element_at_position(&self, pos: u64) -> Result<Option<MmrNode>> {
        Ok(self.0.borrow().get(&pos).cloned())
    }
}

impl MMRStoreWriteOps for &MemStore {
    fn append(&mut self, pos: u64, elems: Vec<MmrNode>) -> Result<()> {
        let mut store = self.0.borrow_mut();
        for (i, elem) in elems.into_iter().enumerate() {
            store.insert(pos + i as u64, elem);
        }
        Ok(())
    }
}
