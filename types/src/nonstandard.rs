use std::sync::Arc;

use strum::Display;

use crate::{containers::BeaconState, primitives::Slot};

/// The transition that produced a state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TransitionKind {
    Initial,
    Slot,
    Block,
    Epoch,
}

/// A beacon state tagged with the transition that produced it.
///
/// Cheap to clone; the underlying state is shared.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExtendedBeaconState {
    state: Arc<BeaconState>,
    transition: TransitionKind,
}

impl ExtendedBeaconState {
    #[must_use]
    pub const fn new(state: Arc<BeaconState>, transition: TransitionKind) -> Self {
        Self { state, transition }
    }

    /// Wraps a state loaded from storage or genesis.
    #[must_use]
    pub const fn initial(state: Arc<BeaconState>) -> Self {
        Self::new(state, TransitionKind::Initial)
    }

    #[must_use]
    pub fn slot(&self) -> Slot {
        self.state.slot
    }

    #[must_use]
    pub const fn state(&self) -> &Arc<BeaconState> {
        &self.state
    }

    #[must_use]
    pub const fn transition(&self) -> TransitionKind {
        self.transition
    }
}
