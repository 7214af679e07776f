//! Phase 0 containers, reduced to the fields this subsystem reads.

use bitvec::{order::Lsb0, vec::BitVec};
use derive_more::Constructor;

use crate::primitives::{Epoch, Gwei, PublicKeyBytes, SignatureBytes, Slot, ValidatorIndex, H256};

/// Aggregation bitfield over the attesting committee.
pub type AggregationBits = BitVec<u8, Lsb0>;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct AttestationData {
    pub slot: Slot,
    pub beacon_block_root: H256,
}

#[derive(Clone, PartialEq, Eq, Hash, Default, Debug)]
pub struct Attestation {
    pub data: AttestationData,
    pub aggregation_bits: AggregationBits,
    pub signature: SignatureBytes,
}

/// An attestation recorded in a beacon state by the block transition.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PendingAttestation {
    pub data: AttestationData,
    pub aggregation_bits: AggregationBits,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Constructor)]
pub struct BeaconBlockHeader {
    pub slot: Slot,
    pub parent_root: H256,
    pub state_root: H256,
    pub body_root: H256,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct BeaconBlock {
    pub slot: Slot,
    pub parent_root: H256,
    pub state_root: H256,
    pub body_root: H256,
}

impl BeaconBlock {
    /// Content root of the block: a binary Merkle combination of its fields.
    #[must_use]
    pub fn hash_tree_root(&self) -> H256 {
        let Self {
            slot,
            parent_root,
            state_root,
            body_root,
        } = self;

        let mut slot_chunk = H256::zero();
        slot_chunk.0[..8].copy_from_slice(&slot.to_le_bytes());

        hashing::hash_256_256(
            hashing::hash_256_256(slot_chunk, *parent_root),
            hashing::hash_256_256(*state_root, *body_root),
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Validator {
    pub pubkey: PublicKeyBytes,
    pub activation_epoch: Epoch,
    pub exit_epoch: Epoch,
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct BeaconState {
    pub slot: Slot,
    pub validators: Vec<Validator>,
    pub previous_epoch_attestations: Vec<PendingAttestation>,
    pub current_epoch_attestations: Vec<PendingAttestation>,
}

impl BeaconState {
    /// Attestations already included on chain, newest epoch last.
    pub fn pending_attestations(&self) -> impl Iterator<Item = &PendingAttestation> {
        self.previous_epoch_attestations
            .iter()
            .chain(&self.current_epoch_attestations)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct IndexedAttestation {
    pub attesting_indices: Vec<ValidatorIndex>,
    pub data: AttestationData,
    pub signature: SignatureBytes,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProposerSlashing {
    pub proposer_index: ValidatorIndex,
    pub header_1: BeaconBlockHeader,
    pub header_2: BeaconBlockHeader,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AttesterSlashing {
    pub attestation_1: IndexedAttestation,
    pub attestation_2: IndexedAttestation,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DepositData {
    pub pubkey: PublicKeyBytes,
    pub withdrawal_credentials: H256,
    pub amount: Gwei,
    pub signature: SignatureBytes,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Deposit {
    pub proof: Vec<H256>,
    pub data: DepositData,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct VoluntaryExit {
    pub epoch: Epoch,
    pub validator_index: ValidatorIndex,
    pub signature: SignatureBytes,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Transfer {
    pub sender: ValidatorIndex,
    pub recipient: ValidatorIndex,
    pub amount: Gwei,
    pub fee: Gwei,
    pub slot: Slot,
    pub pubkey: PublicKeyBytes,
    pub signature: SignatureBytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_roots_are_deterministic_and_field_sensitive() {
        let block = BeaconBlock {
            slot: 3,
            parent_root: H256::repeat_byte(1),
            state_root: H256::repeat_byte(2),
            body_root: H256::repeat_byte(3),
        };

        assert_eq!(block.hash_tree_root(), block.hash_tree_root());

        let sibling = BeaconBlock {
            slot: 4,
            ..block
        };

        assert_ne!(block.hash_tree_root(), sibling.hash_tree_root());
    }

    #[test]
    fn pending_attestations_iterates_previous_epoch_first() {
        let record = |slot| PendingAttestation {
            data: AttestationData {
                slot,
                beacon_block_root: H256::zero(),
            },
            aggregation_bits: AggregationBits::new(),
        };

        let state = BeaconState {
            slot: 16,
            validators: vec![],
            previous_epoch_attestations: vec![record(7)],
            current_epoch_attestations: vec![record(9)],
        };

        let slots = state
            .pending_attestations()
            .map(|pending| pending.data.slot)
            .collect::<Vec<_>>();

        assert_eq!(slots, [7, 9]);
    }
}
