//! A signing identity, abstracted away from the concrete key material so the scheduler can hold
//! many validators' credentials behind the same interface.

use bls::{PublicKey, SecretKey, Signature, SignatureBytes};
use types::primitives::{Domain, PublicKeyBytes, H256};

pub trait Signer: Send + Sync {
    fn pubkey(&self) -> PublicKeyBytes;

    fn sign(&self, message: &H256, domain: Domain) -> SignatureBytes;
}

/// A signer backed by an in-memory BLS secret key. Production deployments would source the key
/// from a remote signer or an encrypted keystore; this is the local, test/emulator-friendly path.
pub struct LocalSigner {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl LocalSigner {
    pub fn new(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&secret_key);
        Self {
            secret_key,
            public_key,
        }
    }
}

impl Signer for LocalSigner {
    fn pubkey(&self) -> PublicKeyBytes {
        (&self.public_key).into()
    }

    fn sign(&self, message: &H256, domain: Domain) -> SignatureBytes {
        let signature = Signature::new(message.as_bytes(), domain.to_integer(), &self.secret_key);
        SignatureBytes::from_bytes(signature.as_bytes().as_slice())
            .expect("a freshly produced BLS signature round-trips through its compressed bytes")
    }
}
