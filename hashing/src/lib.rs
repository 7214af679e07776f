//! SHA-256 helpers for deriving content roots.

use primitive_types::H256;
use sha2::{Digest as _, Sha256};

#[must_use]
pub fn hash_bytes(bytes: impl AsRef<[u8]>) -> H256 {
    H256(Sha256::digest(bytes).into())
}

#[must_use]
pub fn hash_256_256(left: H256, right: H256) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    H256(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn hash_bytes_matches_known_digest() {
        assert_eq!(
            hash_bytes(b"abc"),
            H256(hex!(
                "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
            )),
        );
    }

    #[test]
    fn hash_256_256_is_hash_of_concatenation() {
        let left = H256::repeat_byte(0x11);
        let right = H256::repeat_byte(0x22);

        let mut concatenated = [0; 64];
        concatenated[..32].copy_from_slice(left.as_bytes());
        concatenated[32..].copy_from_slice(right.as_bytes());

        assert_eq!(hash_256_256(left, right), hash_bytes(concatenated));
    }
}
