use crate::HashFn;
use ethereum_types::H256;

pub const BYTES_PER_CHUNK: usize = 32;

/// Splits `bytes` into 32-byte, zero-right-padded chunks.
pub fn pack_bytes(bytes: &[u8]) -> Vec<H256> {
    if bytes.is_empty() {
        return vec![H256::zero()];
    }

    bytes
        .chunks(BYTES_PER_CHUNK)
        .map(|chunk| {
            let mut padded = [0_u8; BYTES_PER_CHUNK];
            padded[..chunk.len()].copy_from_slice(chunk);
            H256::from(padded)
        })
        .collect()
}

/// Produces the Merkle root of `leaves`, right-padding with zero hashes up to the next
/// power of two. An empty leaf set hashes to the all-zero chunk.
pub fn merkleize(leaves: &[H256], hash_fn: &dyn HashFn) -> H256 {
    if leaves.is_empty() {
        return H256::zero();
    }

    if leaves.len() == 1 {
        return leaves[0];
    }

    let leaf_count = leaves.len().next_power_of_two();

    let mut nodes = leaves.to_vec();
    nodes.resize(leaf_count, H256::zero());

    while nodes.len() > 1 {
        let mut parents = Vec::with_capacity(nodes.len() / 2);
        for pair in nodes.chunks(2) {
            let mut concatenated = Vec::with_capacity(BYTES_PER_CHUNK * 2);
            concatenated.extend_from_slice(pair[0].as_bytes());
            concatenated.extend_from_slice(pair[1].as_bytes());
            parents.push(hash_fn.hash(&concatenated));
        }
        nodes = parents;
    }

    nodes[0]
}

/// Mixes a little-endian 32-byte encoded `length` into `root`, as required for
/// variable-length sequences.
pub fn mix_in_length(root: H256, length: usize, hash_fn: &dyn HashFn) -> H256 {
    let mut length_bytes = [0_u8; BYTES_PER_CHUNK];
    length_bytes[..std::mem::size_of::<usize>()].copy_from_slice(&length.to_le_bytes());

    let mut concatenated = Vec::with_capacity(BYTES_PER_CHUNK * 2);
    concatenated.extend_from_slice(root.as_bytes());
    concatenated.extend_from_slice(&length_bytes);
    hash_fn.hash(&concatenated)
}
