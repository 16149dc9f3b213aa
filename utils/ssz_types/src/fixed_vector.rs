use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, Index, IndexMut};

use ethereum_types::H256;
use serde::{Deserialize, Serialize};
use ssz::{Decode, DecodeError, Encode};
use tree_hash::{merkleize, HashFn, TreeHash};
use typenum::Unsigned;

use crate::Error;

/// A homogeneous list whose length is fixed at `N` elements, known at compile time.
/// Encodes as the raw concatenation of its elements; tree-hashes without a length mix-in,
/// since the length can never vary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixedVector<T, N> {
    vec: Vec<T>,
    #[serde(skip)]
    _phantom: PhantomData<N>,
}

impl<T, N: Unsigned> FixedVector<T, N> {
    pub fn new(vec: Vec<T>) -> Result<Self, Error> {
        if vec.len() == N::to_usize() {
            Ok(Self {
                vec,
                _phantom: PhantomData,
            })
        } else {
            Err(Error::InvalidLength {
                len: vec.len(),
                expected: N::to_usize(),
            })
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

    pub fn iter_mut(&mut self) -> std::slice::IterMut<T> {
        self.vec.iter_mut()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.vec.clone()
    }
}

impl<T: Clone + Default, N: Unsigned> From<Vec<T>> for FixedVector<T, N> {
    /// Pads with `T::default()` when `vec` is shorter than `N`, truncates when longer —
    /// matching the lenient constructor used by the upstream `ssz_types` crate.
    fn from(mut vec: Vec<T>) -> Self {
        vec.resize(N::to_usize(), T::default());
        Self {
            vec,
            _phantom: PhantomData,
        }
    }
}

impl<T: Clone + Default, N: Unsigned> Default for FixedVector<T, N> {
    fn default() -> Self {
        Self::from(Vec::new())
    }
}

impl<T, N> Deref for FixedVector<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.vec
    }
}

impl<T, N> DerefMut for FixedVector<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.vec
    }
}

impl<T, N> Index<usize> for FixedVector<T, N> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.vec[i]
    }
}

impl<T, N> IndexMut<usize> for FixedVector<T, N> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.vec[i]
    }
}

impl<'a, T, N> IntoIterator for &'a FixedVector<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.vec.iter()
    }
}

impl<T: Encode, N: Unsigned> Encode for FixedVector<T, N> {
    fn is_ssz_fixed_len() -> bool {
        T::is_ssz_fixed_len()
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.vec.as_ssz_bytes()
    }
}

impl<T: Decode, N: Unsigned> Decode for FixedVector<T, N> {
    fn is_ssz_fixed_len() -> bool {
        T::is_ssz_fixed_len()
    }

    fn ssz_fixed_len() -> usize {
        if T::is_ssz_fixed_len() {
            T::ssz_fixed_len() * N::to_usize()
        } else {
            ssz::BYTES_PER_LENGTH_OFFSET
        }
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let vec = Vec::<T>::from_ssz_bytes(bytes)?;
        Self::new(vec).map_err(|_err| DecodeError::BytesInvalid(format!(
            "fixed vector of length {} should contain exactly {} elements",
            bytes.len(),
            N::to_usize()
        )))
    }
}

impl<T: TreeHash, N: Unsigned> TreeHash for FixedVector<T, N> {
    fn is_tree_hash_fixed_len() -> bool {
        true
    }

    fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> H256 {
        let leaves: Vec<H256> = self.vec.iter().map(|item| item.tree_hash_root(hash_fn)).collect();
        merkleize(&leaves, hash_fn)
    }
}
