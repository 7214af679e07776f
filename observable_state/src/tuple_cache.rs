use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use parking_lot::Mutex;
use std_ext::ArcExt as _;

use types::containers::BeaconBlock;

use crate::misc::BeaconTupleDetails;

pub const DEFAULT_TUPLE_CACHE_SIZE: usize = 256;

/// Bounded cache of imported tuples keyed by block.
///
/// Eviction is by insertion order, so the cache always holds the most
/// recently imported distinct blocks. Re-inserting a known block does not
/// refresh its position.
pub struct TupleCache {
    entries: Mutex<Entries>,
}

struct Entries {
    by_block: HashMap<Arc<BeaconBlock>, BeaconTupleDetails>,
    insertion_order: VecDeque<Arc<BeaconBlock>>,
    capacity: usize,
}

impl Default for TupleCache {
    fn default() -> Self {
        Self::new(DEFAULT_TUPLE_CACHE_SIZE)
    }
}

impl TupleCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries {
                by_block: HashMap::with_capacity(capacity),
                insertion_order: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    pub fn insert(&self, details: BeaconTupleDetails) {
        let mut entries = self.entries.lock();
        let block = details.block().clone_arc();

        if entries.by_block.insert(block.clone_arc(), details).is_none() {
            entries.insertion_order.push_back(block);
        }

        while entries.by_block.len() > entries.capacity {
            let Some(eldest) = entries.insertion_order.pop_front() else {
                break;
            };

            drop(entries.by_block.remove(&eldest));
        }
    }

    #[must_use]
    pub fn get(&self, block: &BeaconBlock) -> Option<BeaconTupleDetails> {
        self.entries.lock().by_block.get(block).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().by_block.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
