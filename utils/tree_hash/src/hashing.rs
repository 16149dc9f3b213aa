use ethereum_types::H256;
use ring::digest::{digest, SHA256};
use tiny_keccak::{Hasher, Keccak};

/// An injectable hash function. Callers on the same network MUST agree on a single
/// implementation; mixing hash functions produces incompatible tree-hash roots.
pub trait HashFn {
    fn hash(&self, bytes: &[u8]) -> H256;
}

/// The default hash function: Keccak-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct Keccak256Hasher;

impl HashFn for Keccak256Hasher {
    fn hash(&self, bytes: &[u8]) -> H256 {
        let mut keccak = Keccak::v256();
        let mut output = [0_u8; 32];
        keccak.update(bytes);
        keccak.finalize(&mut output);
        H256::from(output)
    }
}

/// An alternative hash function, useful for spec vectors produced against SHA-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl HashFn for Sha256Hasher {
    fn hash(&self, bytes: &[u8]) -> H256 {
        H256::from_slice(digest(&SHA256, bytes).as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_is_deterministic() {
        let hasher = Keccak256Hasher;
        assert_eq!(hasher.hash(b"abc"), hasher.hash(b"abc"));
        assert_ne!(hasher.hash(b"abc"), hasher.hash(b"abd"));
    }

    #[test]
    fn keccak_and_sha256_disagree() {
        let a = Keccak256Hasher.hash(b"abc");
        let b = Sha256Hasher.hash(b"abc");
        assert_ne!(a, b);
    }
}
