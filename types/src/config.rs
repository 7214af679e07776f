use core::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::primitives::Slot;

/// Consensus parameters consumed by this subsystem.
///
/// Field names follow the conventional consensus configuration format, so a
/// standard YAML preset file deserializes directly into this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Config {
    pub slots_per_epoch: NonZeroU64,
    pub min_attestation_inclusion_delay: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl Config {
    #[must_use]
    pub const fn mainnet() -> Self {
        Self {
            slots_per_epoch: nonzero(32),
            min_attestation_inclusion_delay: 1,
        }
    }

    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            slots_per_epoch: nonzero(8),
            min_attestation_inclusion_delay: 1,
        }
    }

    #[must_use]
    pub const fn slots_per_epoch(&self) -> u64 {
        self.slots_per_epoch.get()
    }

    /// Slots that must elapse before an attestation becomes stale for
    /// inclusion: `slots_per_epoch + min_attestation_inclusion_delay`.
    #[must_use]
    pub const fn attestation_retention_slots(&self) -> Slot {
        self.slots_per_epoch() + self.min_attestation_inclusion_delay
    }
}

const fn nonzero(value: u64) -> NonZeroU64 {
    match NonZeroU64::new(value) {
        Some(value) => value,
        None => panic!("value must be nonzero"),
    }
}
