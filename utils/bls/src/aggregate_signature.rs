use crate::{aggregate_public_key::AggregatePublicKey, signature::Signature};
use milagro_bls::AggregateSignature as RawAggregateSignature;
use ssz::{Decode, DecodeError, Encode};

#[derive(Clone, PartialEq, Eq)]
pub struct AggregateSignature(RawAggregateSignature);

impl AggregateSignature {
    pub fn new() -> Self {
        Self(RawAggregateSignature::new())
    }

    pub fn add(&mut self, signature: &Signature) {
        self.0.add(signature.as_raw())
    }

    pub fn verify(&self, message: &[u8], domain: u64, aggregate_public_key: &AggregatePublicKey) -> bool {
        self.0.verify(message, domain, aggregate_public_key.as_raw())
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.0.as_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        RawAggregateSignature::from_bytes(bytes)
            .map(Self)
            .map_err(|_| DecodeError::BytesInvalid("invalid BLS aggregate signature".to_string()))
    }
}

impl Default for AggregateSignature {
    fn default() -> Self {
        Self::new()
    }
}

impl Encode for AggregateSignature {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn as_ssz_bytes(&self) -> Vec<u8> {
        self.as_bytes()
    }
}

impl Decode for AggregateSignature {
    fn is_ssz_fixed_len() -> bool {
        true
    }

    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_bytes(bytes)
    }
}
