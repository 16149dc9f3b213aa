//! Wires `BlockStorage`, `Scheduler` and a `Clock` together into the single entry point a host
//! process drives: feed it slot ticks and network-received blocks/attestations, and read off the
//! produced streams (`SchedulerStreams`) for blocks/attestations this node's own validators
//! produce.

use std::sync::Arc;

use anyhow::Result;
use helper_functions::crypto;
use log::info;
use transition_functions::process_slot::process_slots;
use types::{
    beacon_state::BeaconState,
    config::Config,
    primitives::{Slot, H256},
    types::{Attestation, SignedBeaconBlock},
};

use crate::{
    block_storage::BlockStorage,
    clock::Clock,
    deposit_contract::DepositContract,
    observable_state::{ObservableBeaconState, PendingOperations},
    scheduler::{Scheduler, SchedulerStreams, StateUpdate},
    signer::Signer,
};

pub struct Node<C: Config, Clk: Clock> {
    storage: BlockStorage<C>,
    scheduler: Scheduler<C>,
    clock: Clk,
    pending_operations: PendingOperations<C>,
    current_slot: Slot,
}

impl<C: Config, Clk: Clock> Node<C, Clk> {
    /// Builds a node seeded with `genesis_state`. The genesis block's `state_root` is set to the
    /// genesis state's tree-hash root before being handed to `BlockStorage::new`, which re-orgs
    /// to it immediately.
    pub fn new(
        genesis_state: BeaconState<C>,
        deposit_contract: Arc<dyn DepositContract>,
        clock: Clk,
    ) -> (Self, SchedulerStreams<C>) {
        // The way the genesis block is constructed makes it possible for many parties to
        // independently produce the same block.
        let mut genesis_block = SignedBeaconBlock::default();
        // Note that `genesis_block.message.body.eth1_data` is not set to
        // `genesis_state.latest_eth1_data`.
        genesis_block.message.state_root = crypto::hash_tree_root(&genesis_state);

        let current_slot = C::genesis_slot();
        let storage = BlockStorage::new(genesis_state, genesis_block);
        let (scheduler, streams) = Scheduler::new(deposit_contract);

        let node = Self {
            storage,
            scheduler,
            clock,
            pending_operations: PendingOperations::new(),
            current_slot,
        };
        (node, streams)
    }

    pub fn add_validator(&mut self, signer: Arc<dyn Signer>) {
        self.scheduler.add_validator(signer);
    }

    pub fn head_state(&self) -> &BeaconState<C> {
        self.storage.head_state()
    }

    pub fn head_root(&self) -> H256 {
        self.storage.head_root()
    }

    /// Advances the store's notion of wall-clock slot and runs validator duties for it.
    pub fn handle_slot_start(&mut self, slot: Slot) -> Result<()> {
        info!("slot {} started", slot);
        self.storage.store_mut().on_slot(slot)?;
        self.current_slot = slot;

        let observed = self.observe();
        self.scheduler
            .on_update(StateUpdate::SlotTick(observed), &self.clock)
    }

    /// Runs every attester duty scheduled for this slot's midpoint (§4.9).
    pub fn handle_slot_midpoint(&mut self, slot: Slot) -> Result<()> {
        info!("slot {} midpoint", slot);
        self.scheduler.run_due_attestations(self.clock.now_millis())
    }

    /// Accepts a block received from the network (or produced locally), updating fork choice
    /// and the slot-indexed canonical marks, then re-runs validator duties against the resulting
    /// state so the scheduler can react to a re-org.
    pub fn accept_beacon_block(&mut self, block: SignedBeaconBlock<C>) -> Result<()> {
        info!("received beacon block at slot {}", block.message.slot);
        self.storage.put(block)?;
        // Anything still pending has either been superseded by this import or was already
        // included in it; either way it no longer belongs in the next proposal's candidate pool.
        self.pending_operations = PendingOperations::new();

        let observed = self.observe();
        self.scheduler
            .on_update(StateUpdate::BlockImport(observed), &self.clock)
    }

    /// Accepts a gossiped attestation: folds it into fork choice's latest-message cache and
    /// queues it for inclusion in a future locally proposed block.
    pub fn accept_attestation(&mut self, attestation: Attestation<C>) -> Result<()> {
        self.pending_operations
            .attestations
            .push(attestation.clone());
        self.storage.store_mut().on_attestation(attestation)
    }

    /// §4.10's "latest per-slot state": the head block's post-state advanced, via the per-slot
    /// transition only (no block applied), up to `self.current_slot`. Without this, a node that
    /// must itself propose at `current_slot` would hand the proposer a state still stuck at the
    /// parent block's slot (§4.7 requires "a state already advanced to the proposer's slot").
    fn observe(&self) -> ObservableBeaconState<C> {
        let mut latest_slot_state = self.storage.head_state().clone();
        process_slots(&mut latest_slot_state, self.current_slot);

        ObservableBeaconState {
            head_block: self.storage.head_block().clone(),
            latest_slot_state,
            pending_operations: self.pending_operations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bls::SecretKey;
    use ssz_types::VariableList;
    use types::{
        config::{Config, MinimalConfig},
        primitives::{AggregateSignatureBytes, Eth1Data},
        types::{AttestationData, Validator},
    };

    use super::*;
    use crate::{clock::ManualClock, deposit_contract::FixedDepositContract, signer::LocalSigner};

    fn empty_attestation() -> Attestation<MinimalConfig> {
        Attestation {
            aggregation_bits: Default::default(),
            data: AttestationData::default(),
            signature: AggregateSignatureBytes::empty(),
        }
    }

    fn fixed_deposit_contract() -> Arc<dyn DepositContract> {
        Arc::new(FixedDepositContract::new(
            crate::deposit_contract::ChainStart {
                genesis_time: 0,
                eth1_data: Eth1Data::default(),
                deposits: Vec::new(),
            },
            Vec::new(),
        ))
    }

    #[test]
    fn new_node_reorgs_to_genesis() {
        let genesis_state = BeaconState::<MinimalConfig>::default();
        let (node, _streams) = Node::new(genesis_state, fixed_deposit_contract(), ManualClock::new(0));

        assert_eq!(node.head_root(), node.storage.head_root());
    }

    #[test]
    fn accept_beacon_block_clears_pending_operations() {
        let genesis_state = BeaconState::<MinimalConfig>::default();
        let (mut node, _streams) =
            Node::new(genesis_state, fixed_deposit_contract(), ManualClock::new(0));

        node.accept_attestation(empty_attestation()).unwrap();
        assert_eq!(node.pending_operations.attestations.len(), 1);

        let head = node.head_root();
        let mut block = SignedBeaconBlock::<MinimalConfig>::default();
        block.message.slot = 0;
        block.message.parent_root = head;
        block.message.state_root = helper_functions::crypto::hash_tree_root(node.head_state());

        // Re-importing the genesis block is a no-op in fork choice (it's not later than the
        // finalized slot), but `accept_beacon_block` still clears the pending pool on success.
        node.accept_beacon_block(block).unwrap();
        assert!(node.pending_operations.attestations.is_empty());
    }

    #[test]
    fn handle_slot_start_rejects_non_increasing_slot() {
        let genesis_state = BeaconState::<MinimalConfig>::default();
        let (mut node, _streams) =
            Node::new(genesis_state, fixed_deposit_contract(), ManualClock::new(0));

        node.handle_slot_start(1).unwrap();
        assert!(node.handle_slot_start(1).is_err());
    }

    /// S1/S2 end-to-end: a node with a single registered validator, ticked to the slot after
    /// genesis, binds that validator, sees it's the sole (and thus the) proposer, and publishes a
    /// block for that slot — which only happens if `latest_slot_state` was actually advanced to
    /// the ticked slot rather than left at the parent block's slot.
    #[test]
    fn handle_slot_start_fires_proposer_duty_for_sole_validator() {
        let signer = Arc::new(LocalSigner::new(SecretKey::random()));
        let validator = Validator {
            pubkey: signer.pubkey(),
            effective_balance: MinimalConfig::max_effective_balance(),
            activation_epoch: 0,
            exit_epoch: MinimalConfig::far_future_epoch(),
            withdrawable_epoch: MinimalConfig::far_future_epoch(),
            ..Validator::default()
        };
        let genesis_state = BeaconState::<MinimalConfig> {
            genesis_time: 0,
            validators: VariableList::from(vec![validator]),
            balances: VariableList::from(vec![MinimalConfig::max_effective_balance()]),
            ..BeaconState::default()
        };

        let slot_1_millis = MinimalConfig::seconds_per_slot() * 1000;
        let (mut node, mut streams) = Node::new(
            genesis_state,
            fixed_deposit_contract(),
            ManualClock::new(slot_1_millis),
        );
        node.add_validator(signer);

        node.handle_slot_start(1).unwrap();

        let block = streams
            .proposed_blocks
            .try_recv()
            .expect("the sole validator is the proposer for slot 1");
        assert_eq!(block.message.slot, 1);
    }
}
