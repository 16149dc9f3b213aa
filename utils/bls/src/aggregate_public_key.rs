use crate::public_key::PublicKey;
use milagro_bls::AggregatePublicKey as RawAggregatePublicKey;

#[derive(Clone)]
pub struct AggregatePublicKey(RawAggregatePublicKey);

impl AggregatePublicKey {
    pub fn new() -> Self {
        Self(RawAggregatePublicKey::new())
    }

    pub fn add(&mut self, public_key: &PublicKey) {
        self.0.add(public_key.as_raw())
    }

    pub fn as_raw(&self) -> &RawAggregatePublicKey {
        &self.0
    }
}

impl Default for AggregatePublicKey {
    fn default() -> Self {
        Self::new()
    }
}
