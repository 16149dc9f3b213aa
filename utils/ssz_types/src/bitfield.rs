use std::marker::PhantomData;

use ethereum_types::H256;
use serde::{Deserialize, Serialize};
use ssz::{Decode, DecodeError, Encode};
use tree_hash::{merkleize, mix_in_length, pack_bytes, HashFn, TreeHash};
use typenum::Unsigned;

use crate::Error;

fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0_u8; (bits.len() + 7) / 8];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

fn unpack_bits(bytes: &[u8], len: usize) -> Vec<bool> {
    (0..len)
        .map(|i| bytes[i / 8] & (1 << (i % 8)) != 0)
        .collect()
}

/// A bitfield whose length is fixed at `N` bits, known at compile time. Packs into
/// `ceil(N / 8)` bytes with no length marker, since the length can never vary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitVector<N> {
    bits: Vec<bool>,
    #[serde(skip)]
    _phantom: PhantomData<N>,
}

impl<N: Unsigned> BitVector<N> {
    pub fn new() -> Self {
        Self {
            bits: vec![false; N::to_usize()],
            _phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, i: usize) -> Result<bool, Error> {
        self.bits.get(i).copied().ok_or(Error::OutOfBounds {
            i,
            len: self.bits.len(),
        })
    }

    pub fn set(&mut self, i: usize, value: bool) -> Result<(), Error> {
        if i >= self.bits.len() {
            return Err(Error::OutOfBounds {
                i,
                len: self.bits.len(),
            });
        }
        self.bits[i] = value;
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<bool> {
        self.bits.iter()
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        pack_bits(&self.bits)
    }
}

impl<N: Unsigned> Default for BitVector<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Unsigned> Encode for BitVector<N> {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.as_bytes()
    }
}

impl<N: Unsigned> Decode for BitVector<N> {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        (N::to_usize() + 7) / 8
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let expected = Self::ssz_fixed_len();
        if bytes.len() != expected {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected,
            });
        }
        Ok(Self {
            bits: unpack_bits(bytes, N::to_usize()),
            _phantom: PhantomData,
        })
    }
}

impl<N: Unsigned> TreeHash for BitVector<N> {
    fn is_tree_hash_fixed_len() -> bool {
        true
    }

    fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> H256 {
        merkleize(&pack_bytes(&self.as_bytes()), hash_fn)
    }
}

/// A bitfield bounded by at most `N` bits, with a dynamic length that is mixed into the
/// tree-hash root and marked in the SSZ encoding by a sentinel `1` bit following the last
/// logical bit, as in the canonical `Bitlist[N]` encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitList<N> {
    bits: Vec<bool>,
    #[serde(skip)]
    _phantom: PhantomData<N>,
}

impl<N: Unsigned> BitList<N> {
    pub fn with_capacity(len: usize) -> Result<Self, Error> {
        if len > N::to_usize() {
            return Err(Error::ExceedsMaxLength {
                len,
                max: N::to_usize(),
            });
        }
        Ok(Self {
            bits: vec![false; len],
            _phantom: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, i: usize) -> Result<bool, Error> {
        self.bits.get(i).copied().ok_or(Error::OutOfBounds {
            i,
            len: self.bits.len(),
        })
    }

    pub fn set(&mut self, i: usize, value: bool) -> Result<(), Error> {
        if i >= self.bits.len() {
            return Err(Error::OutOfBounds {
                i,
                len: self.bits.len(),
            });
        }
        self.bits[i] = value;
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<bool> {
        self.bits.iter()
    }

    pub fn num_set_bits(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }

    pub fn is_zero(&self) -> bool {
        self.bits.iter().all(|bit| !*bit)
    }
}

impl<N: Unsigned> Default for BitList<N> {
    fn default() -> Self {
        Self {
            bits: Vec::new(),
            _phantom: PhantomData,
        }
    }
}

impl<N: Unsigned> Encode for BitList<N> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        let len = self.bits.len();
        let mut bytes = pack_bits(&self.bits);
        if bytes.len() < len / 8 + 1 {
            bytes.push(0);
        }
        bytes[len / 8] |= 1 << (len % 8);
        bytes
    }
}

impl<N: Unsigned> Decode for BitList<N> {
    fn is_ssz_fixed_len() -> bool {
        false
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::BytesInvalid(
                "BitList requires at least one byte carrying the length marker".to_string(),
            ));
        }

        let highest_set_bit = bytes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(byte_i, byte)| {
                (0..8).rev().find_map(|bit_i| {
                    if byte & (1 << bit_i) != 0 {
                        Some(byte_i * 8 + bit_i)
                    } else {
                        None
                    }
                })
            })
            .ok_or_else(|| DecodeError::BytesInvalid("BitList is missing its length marker bit".to_string()))?;

        let len = highest_set_bit;
        if len > N::to_usize() {
            return Err(DecodeError::BytesInvalid(format!(
                "BitList length {} exceeds maximum {}",
                len,
                N::to_usize()
            )));
        }

        Ok(Self {
            bits: unpack_bits(bytes, len),
            _phantom: PhantomData,
        })
    }
}

impl<N: Unsigned> TreeHash for BitList<N> {
    fn is_tree_hash_fixed_len() -> bool {
        false
    }

    fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> H256 {
        let root = merkleize(&pack_bytes(&pack_bits(&self.bits)), hash_fn);
        mix_in_length(root, self.bits.len(), hash_fn)
    }
}
