//! Thin wrapper around `milagro_bls` giving BLS12-381 key and signature types
//! SSZ/serde-friendly faces, matching the shapes `types::primitives` re-exports.

mod aggregate_public_key;
mod aggregate_signature;
mod keypair;
mod public_key;
mod public_key_bytes;
mod secret_key;
mod signature;
mod signature_bytes;

pub use aggregate_public_key::AggregatePublicKey;
pub use aggregate_signature::AggregateSignature;
pub use keypair::Keypair;
pub use public_key::PublicKey;
pub use public_key_bytes::PublicKeyBytes;
pub use secret_key::SecretKey;
pub use signature::Signature;
pub use signature_bytes::SignatureBytes;
