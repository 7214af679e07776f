//! Advances a post-block state through empty slots to a target slot.

use anyhow::{ensure, Result};
use thiserror::Error;

use helper_functions::misc;
use types::{config::Config, nonstandard::ExtendedBeaconState, primitives::Slot};

use crate::traits::StateTransition;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("projection target {target_slot} is behind the source state at {state_slot}")]
    TargetBehindSource { state_slot: Slot, target_slot: Slot },
}

/// Applies per-slot transitions until `target_slot`, running the epoch
/// transition at every interior epoch boundary. The epoch transition due at
/// `target_slot` itself is deliberately left to [`process_epoch_if_needed`]
/// so that both the pre-epoch and post-epoch states can be observed.
pub fn process_slots(
    config: &Config,
    transition: &impl StateTransition,
    source: &ExtendedBeaconState,
    target_slot: Slot,
) -> Result<ExtendedBeaconState> {
    ensure!(
        source.slot() <= target_slot,
        Error::TargetBehindSource {
            state_slot: source.slot(),
            target_slot,
        },
    );

    let mut state = source.clone();

    for slot in source.slot() + 1..=target_slot {
        state = transition.process_slot(&state)?;

        if misc::is_epoch_start(config, slot) && slot != target_slot {
            state = transition.process_epoch(&state)?;
        }
    }

    Ok(state)
}

/// The epoch transition deferred by [`process_slots`]. `None` when
/// `projected` is not at an epoch boundary or when no slots were advanced.
pub fn process_epoch_if_needed(
    config: &Config,
    transition: &impl StateTransition,
    source: &ExtendedBeaconState,
    projected: &ExtendedBeaconState,
) -> Result<Option<ExtendedBeaconState>> {
    if misc::is_epoch_start(config, projected.slot()) && source.slot() < projected.slot() {
        transition.process_epoch(projected).map(Some)
    } else {
        Ok(None)
    }
}
