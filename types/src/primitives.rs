use fixed_hash::construct_fixed_hash;

pub use primitive_types::H256;

pub type Slot = u64;
pub type Epoch = u64;
pub type ValidatorIndex = u64;
pub type Gwei = u64;

construct_fixed_hash! {
    /// Compressed BLS public key.
    pub struct PublicKeyBytes(48);
}

construct_fixed_hash! {
    /// Compressed BLS signature.
    pub struct SignatureBytes(96);
}

impl PublicKeyBytes {
    /// Deterministic key for interop-style validator registries.
    #[must_use]
    pub fn from_index(validator_index: ValidatorIndex) -> Self {
        let mut bytes = Self::zero();
        bytes.0[..8].copy_from_slice(&validator_index.to_le_bytes());
        bytes
    }
}
