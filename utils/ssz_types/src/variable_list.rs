use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, Index, IndexMut};

use ethereum_types::H256;
use serde::{Deserialize, Serialize};
use ssz::{Decode, DecodeError, Encode};
use tree_hash::{merkleize, mix_in_length, HashFn, TreeHash};
use typenum::Unsigned;

use crate::Error;

/// A homogeneous list bounded by at most `N` elements. Encodes and tree-hashes like a
/// plain sequence (the bound only constrains construction; the length is dynamic until
/// mixed into the root, same as SSZ's `List[T, N]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableList<T, N> {
    vec: Vec<T>,
    #[serde(skip)]
    _phantom: PhantomData<N>,
}

impl<T, N: Unsigned> VariableList<T, N> {
    pub fn new(vec: Vec<T>) -> Result<Self, Error> {
        if vec.len() <= N::to_usize() {
            Ok(Self {
                vec,
                _phantom: PhantomData,
            })
        } else {
            Err(Error::ExceedsMaxLength {
                len: vec.len(),
                max: N::to_usize(),
            })
        }
    }

    pub fn empty() -> Self {
        Self {
            vec: Vec::new(),
            _phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<T> {
        self.vec.iter()
    }

    pub fn push(&mut self, value: T) -> Result<(), Error> {
        if self.vec.len() >= N::to_usize() {
            return Err(Error::ExceedsMaxLength {
                len: self.vec.len() + 1,
                max: N::to_usize(),
            });
        }
        self.vec.push(value);
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.vec.clone()
    }

    pub fn max_len() -> usize {
        N::to_usize()
    }
}

impl<T, N: Unsigned> From<Vec<T>> for VariableList<T, N> {
    /// Silently truncates `vec` to `N` elements, matching the lenient constructor used by
    /// the upstream `ssz_types` crate.
    fn from(mut vec: Vec<T>) -> Self {
        vec.truncate(N::to_usize());
        Self {
            vec,
            _phantom: PhantomData,
        }
    }
}

impl<T, N: Unsigned> Default for VariableList<T, N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, N> Deref for VariableList<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.vec
    }
}

impl<T, N> DerefMut for VariableList<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.vec
    }
}

impl<T, N> Index<usize> for VariableList<T, N> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.vec[i]
    }
}

impl<T, N> IndexMut<usize> for VariableList<T, N> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.vec[i]
    }
}

impl<'a, T, N> IntoIterator for &'a VariableList<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.vec.iter()
    }
}

impl<T, N> IntoIterator for VariableList<T, N> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.vec.into_iter()
    }
}

impl<T: Encode, N: Unsigned> Encode for VariableList<T, N> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.vec.as_ssz_bytes()
    }
}

impl<T: Decode, N: Unsigned> Decode for VariableList<T, N> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let vec = Vec::<T>::from_ssz_bytes(bytes)?;
        Self::new(vec).map_err(|_err| {
            DecodeError::BytesInvalid(format!(
                "list exceeds maximum length {}",
                N::to_usize()
            ))
        })
    }
}

impl<T: TreeHash, N: Unsigned> TreeHash for VariableList<T, N> {
    fn is_tree_hash_fixed_len() -> bool {
        false
    }

    fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> H256 {
        let leaves: Vec<H256> = self.vec.iter().map(|item| item.tree_hash_root(hash_fn)).collect();
        mix_in_length(merkleize(&leaves, hash_fn), self.vec.len(), hash_fn)
    }
}
