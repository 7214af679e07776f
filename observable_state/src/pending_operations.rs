use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use std_ext::ArcExt as _;
use types::{
    containers::{Attestation, AttesterSlashing, Deposit, ProposerSlashing, Transfer, VoluntaryExit},
    primitives::PublicKeyBytes,
};

/// An immutable snapshot of the operations observed on the network but not
/// yet included on chain.
///
/// Only attestations are tracked today; the other operation families are
/// exposed so block production can program against the full interface.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct PendingOperations {
    attestations_by_pubkey: Arc<HashMap<PublicKeyBytes, Vec<Arc<Attestation>>>>,
}

impl PendingOperations {
    #[must_use]
    pub fn new(attestations_by_pubkey: HashMap<PublicKeyBytes, Vec<Arc<Attestation>>>) -> Self {
        Self {
            attestations_by_pubkey: Arc::new(attestations_by_pubkey),
        }
    }

    /// The most recent attestation observed for a validator, by slot.
    #[must_use]
    pub fn latest_attestation(&self, pubkey: PublicKeyBytes) -> Option<Arc<Attestation>> {
        self.attestations_by_pubkey
            .get(&pubkey)?
            .iter()
            .max_by_key(|attestation| attestation.data.slot)
            .cloned()
    }

    /// All attestations observed for a validator, oldest slot first.
    #[must_use]
    pub fn attestations(&self, pubkey: PublicKeyBytes) -> &[Arc<Attestation>] {
        self.attestations_by_pubkey
            .get(&pubkey)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attestations_by_pubkey.is_empty()
    }

    /// Attestations available for inclusion in a block, oldest slot first.
    /// An attestation shared by several committee members appears once.
    #[must_use]
    pub fn peek_attestations(&self, max_count: usize) -> Vec<Arc<Attestation>> {
        let mut attestations = self
            .attestations_by_pubkey
            .values()
            .flatten()
            .cloned()
            .collect::<Vec<_>>();

        attestations.sort_unstable_by_key(|attestation| attestation.data.slot);

        let mut seen = HashSet::with_capacity(attestations.len());
        attestations.retain(|attestation| seen.insert(attestation.clone_arc()));
        attestations.truncate(max_count);
        attestations
    }

    #[must_use]
    pub fn peek_proposer_slashings(&self, _max_count: usize) -> Vec<ProposerSlashing> {
        Vec::new()
    }

    #[must_use]
    pub fn peek_attester_slashings(&self, _max_count: usize) -> Vec<AttesterSlashing> {
        Vec::new()
    }

    #[must_use]
    pub fn peek_deposits(&self, _max_count: usize) -> Vec<Deposit> {
        Vec::new()
    }

    #[must_use]
    pub fn peek_voluntary_exits(&self, _max_count: usize) -> Vec<VoluntaryExit> {
        Vec::new()
    }

    #[must_use]
    pub fn peek_transfers(&self, _max_count: usize) -> Vec<Transfer> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use std_ext::ArcExt as _;
    use types::containers::AttestationData;

    use super::*;

    fn attestation(slot: u64) -> Arc<Attestation> {
        Arc::new(Attestation {
            data: AttestationData {
                slot,
                ..AttestationData::default()
            },
            ..Attestation::default()
        })
    }

    #[test]
    fn latest_attestation_picks_the_highest_slot() {
        let pubkey = PublicKeyBytes::from_index(0);
        let snapshot = PendingOperations::new(HashMap::from([(
            pubkey,
            vec![attestation(3), attestation(7), attestation(5)],
        )]));

        let latest = snapshot
            .latest_attestation(pubkey)
            .expect("validator has attestations");

        assert_eq!(latest.data.slot, 7);
        assert_eq!(
            snapshot.latest_attestation(PublicKeyBytes::from_index(1)),
            None,
        );
    }

    #[test]
    fn peek_attestations_orders_by_slot_and_respects_the_limit() {
        let snapshot = PendingOperations::new(HashMap::from([
            (PublicKeyBytes::from_index(0), vec![attestation(9)]),
            (PublicKeyBytes::from_index(1), vec![attestation(2)]),
            (PublicKeyBytes::from_index(2), vec![attestation(5)]),
        ]));

        let slots = snapshot
            .peek_attestations(2)
            .into_iter()
            .map(|attestation| attestation.data.slot)
            .collect::<Vec<_>>();

        assert_eq!(slots, [2, 5]);
    }

    #[test]
    fn peek_attestations_collapses_attestations_shared_across_validators() {
        let shared = attestation(5);
        let distinct = Arc::new(Attestation {
            data: AttestationData {
                slot: 5,
                beacon_block_root: types::primitives::H256::repeat_byte(1),
            },
            ..Attestation::default()
        });

        // Another validator's copy of the same aggregate may not sort next
        // to the first one.
        let snapshot = PendingOperations::new(HashMap::from([
            (PublicKeyBytes::from_index(0), vec![shared.clone_arc()]),
            (PublicKeyBytes::from_index(1), vec![distinct.clone_arc()]),
            (PublicKeyBytes::from_index(2), vec![shared.clone_arc()]),
        ]));

        let peeked = snapshot.peek_attestations(16);

        assert_eq!(peeked.len(), 2);
        assert!(peeked.contains(&shared));
        assert!(peeked.contains(&distinct));
    }

    #[test]
    fn untracked_operation_families_are_empty() {
        let snapshot = PendingOperations::default();

        assert!(snapshot.peek_proposer_slashings(16).is_empty());
        assert!(snapshot.peek_attester_slashings(16).is_empty());
        assert!(snapshot.peek_deposits(16).is_empty());
        assert!(snapshot.peek_voluntary_exits(16).is_empty());
        assert!(snapshot.peek_transfers(16).is_empty());
    }
}
