//! Seams to the collaborators this subsystem consumes.

use std::sync::Arc;

use anyhow::Result;

use types::{
    containers::{Attestation, BeaconBlock, Validator},
    nonstandard::ExtendedBeaconState,
    primitives::H256,
};

use crate::misc::BeaconTuple;

/// The fork choice rule. The resolver argument returns the latest
/// attestation observed for a validator, or `None` when the validator has
/// not attested recently.
pub trait HeadFunction: Send + 'static {
    fn head(
        &self,
        latest_attestation: &dyn Fn(&Validator) -> Option<Arc<Attestation>>,
    ) -> Result<Arc<BeaconBlock>>;
}

/// The per-slot and per-epoch state transitions.
pub trait StateTransition: Send + 'static {
    /// Advances the state across one empty slot.
    fn process_slot(&self, state: &ExtendedBeaconState) -> Result<ExtendedBeaconState>;

    /// Applies the epoch transition to a state at an epoch boundary.
    fn process_epoch(&self, state: &ExtendedBeaconState) -> Result<ExtendedBeaconState>;
}

/// Lookup of block/state tuples by block root.
pub trait TupleStorage: Send + 'static {
    fn get(&self, block_root: H256) -> Result<Option<BeaconTuple>>;
}
