use anyhow::{ensure, Result};

use types::{
    config::Config,
    containers::{AggregationBits, AttestationData, BeaconState},
    primitives::{PublicKeyBytes, Slot, ValidatorIndex},
};

use crate::error::Error;

/// Members of the committee attesting at `slot`.
///
/// The registry is partitioned round-robin over the slots of an epoch, so
/// committee membership is stable for a given registry size.
#[must_use]
pub fn beacon_committee(config: &Config, state: &BeaconState, slot: Slot) -> Vec<ValidatorIndex> {
    let committee_count = config.slots_per_epoch();

    (0..state.validators.len() as u64)
        .filter(|validator_index| validator_index % committee_count == slot % committee_count)
        .collect()
}

/// Expands an aggregation bitfield into the indices of the validators that
/// participated in the attestation.
pub fn get_attestation_participants(
    config: &Config,
    state: &BeaconState,
    data: &AttestationData,
    aggregation_bits: &AggregationBits,
) -> Result<Vec<ValidatorIndex>> {
    let committee = beacon_committee(config, state, data.slot);

    ensure!(
        aggregation_bits.len() == committee.len(),
        Error::BitfieldLengthMismatch {
            bitfield_length: aggregation_bits.len(),
            committee_size: committee.len(),
        },
    );

    let participants = committee
        .into_iter()
        .zip(aggregation_bits.iter().by_vals())
        .filter(|(_, bit)| *bit)
        .map(|(validator_index, _)| validator_index)
        .collect();

    Ok(participants)
}

pub fn map_indices_to_pubkeys(
    state: &BeaconState,
    indices: &[ValidatorIndex],
) -> Result<Vec<PublicKeyBytes>> {
    indices
        .iter()
        .map(|validator_index| {
            let validator = usize::try_from(*validator_index)
                .ok()
                .and_then(|position| state.validators.get(position))
                .ok_or(Error::ValidatorIndexOutOfBounds {
                    validator_index: *validator_index,
                    registry_size: state.validators.len(),
                })?;

            Ok(validator.pubkey)
        })
        .collect()
}
