use crate::secret_key::SecretKey;
use milagro_bls::PublicKey as RawPublicKey;
use serde::Deserialize;
use ssz::{Decode, DecodeError, Encode};
use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(RawPublicKey);

impl PublicKey {
    pub fn from_secret_key(secret_key: &SecretKey) -> Self {
        Self(RawPublicKey::from_secret_key(secret_key.as_raw()))
    }

    pub fn as_raw(&self) -> &RawPublicKey {
        &self.0
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.0.as_bytes()
    }

    pub fn as_uncompressed_bytes(&self) -> Vec<u8> {
        self.0.as_uncompressed_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        RawPublicKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| DecodeError::BytesInvalid("invalid BLS public key".to_string()))
    }

    pub fn concatenated_hex_id(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.concatenated_hex_id())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.concatenated_hex_id())
    }
}

impl Encode for PublicKey {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.as_bytes()
    }
}

impl Decode for PublicKey {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes(bytes)
    }
}

impl serde::Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", self.concatenated_hex_id()))
    }
}

impl<'de> serde::Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_string = String::deserialize(deserializer)?;
        let bytes = hex::decode(hex_string.trim_start_matches("0x"))
            .map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(|e| serde::de::Error::custom(format!("{:?}", e)))
    }
}
