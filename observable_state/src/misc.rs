use std::sync::Arc;

use derive_more::Constructor;

use types::{
    containers::BeaconBlock,
    nonstandard::ExtendedBeaconState,
    primitives::Slot,
};

use crate::pending_operations::PendingOperations;

/// A block paired with its post-block state, as loaded from storage.
#[derive(Clone, PartialEq, Debug, Constructor)]
pub struct BeaconTuple {
    pub block: Arc<BeaconBlock>,
    pub state: Arc<ExtendedBeaconState>,
}

/// A tuple optionally augmented with the intermediate states the importer
/// produced while applying the block.
#[derive(Clone, PartialEq, Debug)]
pub struct BeaconTupleDetails {
    pub tuple: BeaconTuple,
    pub post_slot_state: Option<Arc<ExtendedBeaconState>>,
    pub post_block_state: Option<Arc<ExtendedBeaconState>>,
    pub post_epoch_state: Option<Arc<ExtendedBeaconState>>,
}

impl BeaconTupleDetails {
    #[must_use]
    pub const fn from_tuple(tuple: BeaconTuple) -> Self {
        Self {
            tuple,
            post_slot_state: None,
            post_block_state: None,
            post_epoch_state: None,
        }
    }

    #[must_use]
    pub const fn block(&self) -> &Arc<BeaconBlock> {
        &self.tuple.block
    }

    /// The post-block state, advanced past the epoch transition if the
    /// importer applied one.
    #[must_use]
    pub const fn final_state(&self) -> &Arc<ExtendedBeaconState> {
        &self.tuple.state
    }
}

/// The current fork choice winner.
#[derive(Clone, PartialEq, Debug, Constructor)]
pub struct ChainHead {
    pub tuple: BeaconTuple,
}

impl ChainHead {
    #[must_use]
    pub const fn block(&self) -> &Arc<BeaconBlock> {
        &self.tuple.block
    }

    #[must_use]
    pub const fn state(&self) -> &Arc<ExtendedBeaconState> {
        &self.tuple.state
    }

    #[must_use]
    pub fn slot(&self) -> Slot {
        self.tuple.block.slot
    }
}

/// The state a validator at the current wall clock slot should reason
/// about: the head block, its post-state advanced to the current slot, and
/// the operations available for inclusion.
#[derive(Clone, PartialEq, Debug, Constructor)]
pub struct ObservableBeaconState {
    pub block: Arc<BeaconBlock>,
    pub state: Arc<ExtendedBeaconState>,
    pub pending_operations: PendingOperations,
}
