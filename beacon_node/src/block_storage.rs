//! Named block/tuple storage operations (`put`/`get`/`get_slot_blocks`/`reorg_to`/...) layered
//! over `fork_choice::Store`, which already owns the hash-keyed block map and the LMD-GHOST head
//! computation. `BlockStorage` adds the slot-indexed secondary index and canonical-mark bookkeeping
//! so callers can address blocks the way the storage contract names them, without duplicating the
//! fork-choice engine's own bookkeeping.

use std::collections::BTreeMap;

use fork_choice::Store;
use helper_functions::crypto::hash_tree_root;
use types::{
    config::Config,
    primitives::{Slot, H256},
    types::SignedBeaconBlock,
    BeaconState,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("block {0:?} is not present in storage")]
    BlockNotFound(H256),
    #[error("cannot remove canonical block {0:?}")]
    CannotRemoveCanonical(H256),
}

/// The ordered set of block hashes known at a slot, plus which one (if any) is canonical.
#[derive(Clone, Debug, Default)]
pub struct SlotBlocks {
    hashes: Vec<H256>,
    canonical_index: Option<usize>,
}

impl SlotBlocks {
    pub fn hashes(&self) -> &[H256] {
        &self.hashes
    }

    pub fn canonical(&self) -> Option<H256> {
        self.canonical_index.map(|index| self.hashes[index])
    }
}

pub struct BlockStorage<C: Config> {
    store: Store<C>,
    slots: BTreeMap<Slot, SlotBlocks>,
    justified_hashes: Vec<H256>,
    finalized_hashes: Vec<H256>,
}

impl<C: Config> BlockStorage<C> {
    /// Creates storage seeded with the genesis block, which is automatically re-orged to.
    pub fn new(genesis_state: BeaconState<C>, genesis_block: SignedBeaconBlock<C>) -> Self {
        let genesis_hash = hash_tree_root(&genesis_block.message);
        let mut storage = Self {
            store: Store::new(genesis_state, genesis_block),
            slots: BTreeMap::new(),
            justified_hashes: Vec::new(),
            finalized_hashes: Vec::new(),
        };
        storage.index_block(0, genesis_hash);
        storage.reorg_to(genesis_hash);
        storage
    }

    fn index_block(&mut self, slot: Slot, hash: H256) {
        let slot_blocks = self.slots.entry(slot).or_insert_with(SlotBlocks::default);
        if !slot_blocks.hashes.contains(&hash) {
            slot_blocks.hashes.push(hash);
        }
    }

    /// Idempotent on a duplicate hash: re-inserting an already-known block is a no-op as far as
    /// the secondary index is concerned (`fork_choice::Store::on_block` is idempotent too).
    ///
    /// Re-orgs to whatever `fork_choice::Store` now considers the head, so the slot-indexed
    /// canonical marks stay in lockstep with the LMD-GHOST computation instead of drifting.
    pub fn put(&mut self, block: SignedBeaconBlock<C>) -> anyhow::Result<()> {
        let hash = hash_tree_root(&block.message);
        let slot = block.message.slot;
        self.index_block(slot, hash);
        self.store.on_block(block)?;
        self.reorg_to(self.store.head_root());
        Ok(())
    }

    pub fn remove(&mut self, hash: H256) -> Result<(), Error> {
        for slot_blocks in self.slots.values() {
            if slot_blocks.canonical() == Some(hash) {
                return Err(Error::CannotRemoveCanonical(hash));
            }
        }
        for slot_blocks in self.slots.values_mut() {
            slot_blocks.hashes.retain(|known| *known != hash);
        }
        Ok(())
    }

    pub fn get(&self, hash: H256) -> Option<&SignedBeaconBlock<C>> {
        self.store.block(hash)
    }

    pub fn get_slot_blocks(&self, slot: Slot) -> Option<&SlotBlocks> {
        self.slots.get(&slot)
    }

    pub fn get_slot_canonical_block(&self, slot: Slot) -> Option<&SignedBeaconBlock<C>> {
        let hash = self.slots.get(&slot)?.canonical()?;
        self.get(hash)
    }

    pub fn get_max_slot(&self) -> Option<Slot> {
        self.slots.keys().next_back().copied()
    }

    /// Walks ancestors of `new_head` back toward genesis, marking each one canonical at its slot,
    /// stopping as soon as a slot is already canonical for the ancestor being visited.
    pub fn reorg_to(&mut self, new_head: H256) {
        let mut current = new_head;
        loop {
            let block = match self.store.block(current) {
                Some(block) => block,
                None => break,
            };
            let slot = block.message.slot;
            let parent = block.message.parent_root;

            let already_canonical = self
                .slots
                .get(&slot)
                .and_then(SlotBlocks::canonical)
                .map_or(false, |canonical| canonical == current);

            let slot_blocks = self.slots.entry(slot).or_insert_with(SlotBlocks::default);
            let index = slot_blocks
                .hashes
                .iter()
                .position(|hash| *hash == current)
                .unwrap_or_else(|| {
                    slot_blocks.hashes.push(current);
                    slot_blocks.hashes.len() - 1
                });
            slot_blocks.canonical_index = Some(index);

            if already_canonical || slot == 0 {
                break;
            }
            current = parent;
        }
    }

    pub fn add_justified_hash(&mut self, hash: H256) {
        self.justified_hashes.push(hash);
    }

    pub fn add_finalized_hash(&mut self, hash: H256) {
        self.finalized_hashes.push(hash);
    }

    pub fn head_state(&self) -> &BeaconState<C> {
        self.store.head_state()
    }

    pub fn head_root(&self) -> H256 {
        self.store.head_root()
    }

    pub fn head_block(&self) -> &SignedBeaconBlock<C> {
        self.get(self.head_root())
            .expect("the head root always names a block present in storage")
    }

    pub fn store(&self) -> &Store<C> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store<C> {
        &mut self.store
    }
}
