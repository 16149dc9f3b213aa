use crate::public_key::PublicKey;
use serde::Deserialize;
use ssz::{Decode, DecodeError, Encode};
use std::convert::TryFrom;
use std::fmt;
use tree_hash::{HashFn, TreeHash};

pub const PUBLIC_KEY_BYTES_LEN: usize = 48;

/// The compressed, SSZ-encodable form of a [`PublicKey`](crate::PublicKey).
///
/// Kept around uninflated so invalid points can travel through a block without
/// failing deserialization before signature verification has a chance to reject them.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKeyBytes([u8; PUBLIC_KEY_BYTES_LEN]);

impl PublicKeyBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != PUBLIC_KEY_BYTES_LEN {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: PUBLIC_KEY_BYTES_LEN,
            });
        }
        let mut array = [0; PUBLIC_KEY_BYTES_LEN];
        array.copy_from_slice(bytes);
        Ok(Self(array))
    }

    pub fn empty() -> Self {
        Self([0; PUBLIC_KEY_BYTES_LEN])
    }
}

impl Default for PublicKeyBytes {
    fn default() -> Self {
        Self::empty()
    }
}

impl TreeHash for PublicKeyBytes {
    fn is_tree_hash_fixed_len() -> bool {
        true
    }

    fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> ethereum_types::H256 {
        self.0.tree_hash_root(hash_fn)
    }
}

impl From<&PublicKey> for PublicKeyBytes {
    fn from(public_key: &PublicKey) -> Self {
        Self::from_bytes(&public_key.as_bytes()).expect("public key always encodes to 48 bytes")
    }
}

impl fmt::Debug for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..]))
    }
}

impl Encode for PublicKeyBytes {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl Decode for PublicKeyBytes {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn ssz_fixed_len() -> usize {
        PUBLIC_KEY_BYTES_LEN
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes(bytes)
    }
}

impl serde::Serialize for PublicKeyBytes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.0[..])))
    }
}

impl<'de> serde::Deserialize<'de> for PublicKeyBytes {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_string = String::deserialize(deserializer)?;
        let bytes = hex::decode(hex_string.trim_start_matches("0x"))
            .map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(|e| serde::de::Error::custom(format!("{:?}", e)))
    }
}

impl TryFrom<&PublicKeyBytes> for PublicKey {
    type Error = DecodeError;

    fn try_from(bytes: &PublicKeyBytes) -> Result<Self, Self::Error> {
        PublicKey::from_bytes(bytes.as_bytes())
    }
}
