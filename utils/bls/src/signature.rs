use crate::{public_key::PublicKey, secret_key::SecretKey, signature_bytes::SignatureBytes};
use milagro_bls::Signature as RawSignature;
use serde::Deserialize;
use ssz::{Decode, DecodeError, Encode};
use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Signature(RawSignature);

impl Signature {
    pub fn new(message: &[u8], domain: u64, secret_key: &SecretKey) -> Self {
        Self(RawSignature::new(message, domain, secret_key.as_raw()))
    }

    pub fn verify(&self, message: &[u8], domain: u64, public_key: &PublicKey) -> bool {
        self.0.verify(message, domain, public_key.as_raw())
    }

    pub fn as_raw(&self) -> &RawSignature {
        &self.0
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.0.as_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        RawSignature::from_bytes(bytes)
            .map(Self)
            .map_err(|_| DecodeError::BytesInvalid("invalid BLS signature".to_string()))
    }

    pub fn empty_signature() -> Self {
        let sk = SecretKey::random();
        Self::new(&[], 0, &sk)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.as_bytes()))
    }
}

impl Encode for Signature {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.as_bytes()
    }
}

impl Decode for Signature {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes(bytes)
    }
}

impl serde::Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.as_bytes())))
    }
}

impl<'de> serde::Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex_string = String::deserialize(deserializer)?;
        let bytes = hex::decode(hex_string.trim_start_matches("0x"))
            .map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(|e| serde::de::Error::custom(format!("{:?}", e)))
    }
}

impl From<&Signature> for SignatureBytes {
    fn from(signature: &Signature) -> Self {
        SignatureBytes::from_bytes(&signature.as_bytes())
            .expect("signature always encodes to 96 bytes")
    }
}
