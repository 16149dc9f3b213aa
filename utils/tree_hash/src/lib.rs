//! SSZ tree-hash (Merkleization) with an injectable hash function.
//!
//! Every implementor agrees on a single [`HashFn`] for a given network; mixing hash
//! functions between two parties produces roots that silently disagree.

mod cache;
mod hashing;
mod impls;
mod merkleize;

pub use cache::Cached;
pub use hashing::{HashFn, Keccak256Hasher, Sha256Hasher};
pub use merkleize::{mix_in_length, pack_bytes, merkleize, BYTES_PER_CHUNK};

use ethereum_types::H256;

/// A type whose canonical tree-hash root can be computed under an injected hasher.
pub trait TreeHash {
    fn is_tree_hash_fixed_len() -> bool;

    fn tree_hash_root(&self, hash_fn: &dyn HashFn) -> H256;
}

/// A type that can produce the root used as the message when it is BLS-signed: the
/// tree-hash root of the value with its `signature` field treated as absent.
///
/// Implemented by `#[derive(TreeHash)]` containers that carry a trailing `signature`
/// field; the derive emits this impl alongside `TreeHash` whenever such a field exists.
pub trait SignedRoot: TreeHash {
    fn signed_root(&self, hash_fn: &dyn HashFn) -> H256;
}
