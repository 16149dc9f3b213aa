use milagro_bls::SecretKey as RawSecretKey;
use serde_derive::{Deserialize, Serialize};
use ssz::{Decode, DecodeError, Encode};
use std::fmt;

/// A single BLS12-381 secret key.
///
/// Never serialized to SSZ or logged; `Debug` is intentionally redacted.
#[derive(Clone, Serialize, Deserialize)]
pub struct SecretKey(#[serde(with = "serde_raw_secret_key")] RawSecretKey);

impl SecretKey {
    pub fn random() -> Self {
        Self(RawSecretKey::random(&mut rand::thread_rng()))
    }

    pub fn as_raw(&self) -> &RawSecretKey {
        &self.0
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.0.as_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        RawSecretKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| DecodeError::BytesInvalid("invalid BLS secret key".to_string()))
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SecretKey(..)")
    }
}

impl Encode for SecretKey {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.as_bytes()
    }
}

impl Decode for SecretKey {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes(bytes)
    }
}

mod serde_raw_secret_key {
    use super::RawSecretKey;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &RawSecretKey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(key.as_bytes()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<RawSecretKey, D::Error> {
        let hex_string = String::deserialize(deserializer)?;
        let bytes = hex::decode(hex_string.trim_start_matches("0x"))
            .map_err(serde::de::Error::custom)?;
        RawSecretKey::from_bytes(&bytes).map_err(|_| serde::de::Error::custom("invalid secret key"))
    }
}
