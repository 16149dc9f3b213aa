use crate::merkleize::{merkleize, mix_in_length, pack_bytes};
use crate::{HashFn, TreeHash};
use ethereum_types::H256;

macro_rules! tree_hash_for_uintn {
    ( $(($type_ident: ty, $size_in_bits: expr)),* ) => { $(
        impl TreeHash for $type_ident {
            fn is_tree_hash_fixed_len() -> bool {
                true
            }

            fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> H256 {
                merkleize(&pack_bytes(&self.to_le_bytes()), hash_fn)
            }
        }
    )* };
}

tree_hash_for_uintn!(
    (u8, 8),
    (u16, 16),
    (u32, 32),
    (u64, 64),
    (usize, std::mem::size_of::<usize>() * 8)
);

impl TreeHash for bool {
    fn is_tree_hash_fixed_len() -> bool {
        true
    }

    fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> H256 {
        (*self as u8).tree_hash_root(hash_fn)
    }
}

macro_rules! tree_hash_for_u8_array {
    ($size: expr) => {
        impl TreeHash for [u8; $size] {
            fn is_tree_hash_fixed_len() -> bool {
                true
            }

            fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> H256 {
                merkleize(&pack_bytes(&self[..]), hash_fn)
            }
        }
    };
}

tree_hash_for_u8_array!(4);
tree_hash_for_u8_array!(32);
tree_hash_for_u8_array!(48);
tree_hash_for_u8_array!(96);

impl TreeHash for H256 {
    fn is_tree_hash_fixed_len() -> bool {
        true
    }

    fn tree_hash_root(&self, _hash_fn: &dyn HashFn) -> H256 {
        *self
    }
}

impl<T: TreeHash> TreeHash for Vec<T> {
    fn is_tree_hash_fixed_len() -> bool {
        false
    }

    fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> H256 {
        let leaves: Vec<H256> = self.iter().map(|item| item.tree_hash_root(hash_fn)).collect();
        mix_in_length(merkleize(&leaves, hash_fn), self.len(), hash_fn)
    }
}

impl<T: TreeHash> TreeHash for Option<T> {
    fn is_tree_hash_fixed_len() -> bool {
        false
    }

    fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> H256 {
        match self {
            None => mix_in_length(H256::zero(), 0, hash_fn),
            Some(value) => mix_in_length(value.tree_hash_root(hash_fn), 1, hash_fn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keccak256Hasher;

    #[test]
    fn u64_root_is_padded_value() {
        let root = 1_u64.tree_hash_root(&Keccak256Hasher);
        let mut expected = [0_u8; 32];
        expected[0] = 1;
        assert_eq!(root.as_bytes(), &expected[..]);
    }

    #[test]
    fn h256_is_identity() {
        let value = H256::repeat_byte(9);
        assert_eq!(value.tree_hash_root(&Keccak256Hasher), value);
    }

    #[test]
    fn vec_mixes_in_length() {
        let a: Vec<u64> = vec![1, 2, 3];
        let b: Vec<u64> = vec![1, 2, 3, 0];
        assert_ne!(
            a.tree_hash_root(&Keccak256Hasher),
            b.tree_hash_root(&Keccak256Hasher)
        );
    }

    #[test]
    fn empty_vec_is_stable() {
        let empty: Vec<u64> = vec![];
        assert_eq!(
            empty.tree_hash_root(&Keccak256Hasher),
            empty.tree_hash_root(&Keccak256Hasher)
        );
    }
}
