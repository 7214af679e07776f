use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use std_ext::ArcExt as _;

use types::{
    containers::Attestation,
    primitives::{PublicKeyBytes, Slot},
};

use crate::pending_operations::PendingOperations;

/// Attestations received from the network.
///
/// The buffer holds attestations whose participants have not been expanded
/// yet. The cache keys the latest observed attestation by validator and
/// slot; "latest" means last written, so replays overwrite in place.
#[derive(Default)]
pub struct AttestationPool {
    buffer: Mutex<Vec<Arc<Attestation>>>,
    latest_by_validator: Mutex<HashMap<(PublicKeyBytes, Slot), Arc<Attestation>>>,
}

impl AttestationPool {
    pub fn offer(&self, attestation: Arc<Attestation>) {
        self.buffer.lock().push(attestation);
    }

    /// Removes and returns the buffered attestations with
    /// `data.slot <= slot`, preserving insertion order.
    pub fn drain_up_to(&self, slot: Slot) -> Vec<Arc<Attestation>> {
        let mut buffer = self.buffer.lock();

        let (drained, kept): (Vec<_>, Vec<_>) = core::mem::take(&mut *buffer)
            .into_iter()
            .partition(|attestation| attestation.data.slot <= slot);

        *buffer = kept;
        drained
    }

    pub fn ingest_latest(&self, pubkey: PublicKeyBytes, attestation: Arc<Attestation>) {
        let slot = attestation.data.slot;
        drop(
            self.latest_by_validator
                .lock()
                .insert((pubkey, slot), attestation),
        );
    }

    /// Drops the cache entry for an attestation that made it on chain.
    pub fn forget(&self, pubkey: PublicKeyBytes, slot: Slot) {
        drop(self.latest_by_validator.lock().remove(&(pubkey, slot)));
    }

    /// Removes every cache entry with `slot <= threshold_slot`.
    pub fn purge(&self, threshold_slot: Slot) {
        self.latest_by_validator
            .lock()
            .retain(|(_, slot), _| *slot > threshold_slot);
    }

    /// A frozen copy of the cache grouped by validator, each list sorted by
    /// slot.
    #[must_use]
    pub fn snapshot(&self) -> PendingOperations {
        let mut by_pubkey = HashMap::<_, Vec<_>>::new();

        for ((pubkey, _), attestation) in self.latest_by_validator.lock().iter() {
            by_pubkey
                .entry(*pubkey)
                .or_default()
                .push(attestation.clone_arc());
        }

        for attestations in by_pubkey.values_mut() {
            attestations.sort_unstable_by_key(|attestation| attestation.data.slot);
        }

        PendingOperations::new(by_pubkey)
    }
}
