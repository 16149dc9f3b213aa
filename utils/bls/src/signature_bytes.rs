use crate::signature::Signature;
use serde::Deserialize;
use ssz::{Decode, DecodeError, Encode};
use std::convert::TryFrom;
use std::fmt;
use tree_hash::{HashFn, TreeHash};

pub const SIGNATURE_BYTES_LEN: usize = 96;

#[derive(Clone, PartialEq, Eq)]
pub struct SignatureBytes([u8; SIGNATURE_BYTES_LEN]);

impl SignatureBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != SIGNATURE_BYTES_LEN {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: SIGNATURE_BYTES_LEN,
            });
        }
        let mut array = [0; SIGNATURE_BYTES_LEN];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }

    pub fn empty() -> Self {
        Self([0; SIGNATURE_BYTES_LEN])
    }
}

impl Default for SignatureBytes {
    fn default() -> Self {
        Self::empty()
    }
}

impl TreeHash for SignatureBytes {
    fn is_tree_hash_fixed_len() -> bool {
        true
    }

    fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> ethereum_types::H256 {
        self.0.tree_hash_root(hash_fn)
    }
}

impl fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..]))
    }
}

impl Encode for SignatureBytes {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl Decode for SignatureBytes {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        SIGNATURE_BYTES_LEN
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes(bytes)
    }
}

impl serde::Serialize for SignatureBytes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.0[..])))
    }
}

impl<'de> serde::Deserialize<'de> for SignatureBytes {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_string = String::deserialize(deserializer)?;
        let bytes = hex::decode(hex_string.trim_start_matches("0x"))
            .map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(|e| serde::de::Error::custom(format!("{:?}", e)))
    }
}

impl TryFrom<&SignatureBytes> for Signature {
    type Error = DecodeError;

    fn try_from(bytes: &SignatureBytes) -> Result<Self, Self::Error> {
        Signature::from_bytes(bytes.as_bytes())
    }
}
