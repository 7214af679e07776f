use thiserror::Error;

use types::primitives::ValidatorIndex;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("aggregation bitfield has {bitfield_length} bits but the committee has {committee_size} members")]
    BitfieldLengthMismatch {
        bitfield_length: usize,
        committee_size: usize,
    },
    #[error("validator index {validator_index} is out of bounds in a registry of {registry_size}")]
    ValidatorIndexOutOfBounds {
        validator_index: ValidatorIndex,
        registry_size: usize,
    },
}
