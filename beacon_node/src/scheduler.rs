//! Multi-validator duty scheduler (the "validator service" of §4.9/§5): holds every local
//! validator identity, watches the observable-state stream, and decides proposer/attester
//! duties on each slot, publishing the resulting blocks/attestations to their subscribers.
//!
//! All mutation of `last_processed_slot`, `initialized`, `uninitialized` and `recent_state`
//! happens on whichever thread calls [`Scheduler::on_update`]/[`Scheduler::run_due_attestations`];
//! callers are expected to serialize those calls onto a single executor the way
//! `fork_choice::Store` callers serialize `on_block`/`on_attestation`, which removes the need for
//! internal locking.

use std::collections::HashMap;
use std::sync::{mpsc, Arc};

use error_utils::DebugAsError;
use helper_functions::beacon_state_accessors::{
    get_beacon_committee, get_beacon_proposer_index, get_committee_count_at_slot,
};
use types::{
    config::Config,
    primitives::{CommitteeIndex, PublicKeyBytes, Slot, ValidatorIndex},
    types::{Attestation, SignedBeaconBlock},
};

use crate::{
    attester, clock::Clock, deposit_contract::DepositContract, observable_state::ObservableBeaconState,
    proposer, signer::Signer,
};

/// An observable-state delivery, tagged with what produced it: a plain slot tick (no new block)
/// or the import of a freshly processed block. The proposer duty only fires on the former — a
/// state update caused by importing our own or somebody else's block must not trigger another
/// proposal for the same slot.
pub enum StateUpdate<C: Config> {
    SlotTick(ObservableBeaconState<C>),
    BlockImport(ObservableBeaconState<C>),
}

impl<C: Config> StateUpdate<C> {
    fn state(&self) -> &ObservableBeaconState<C> {
        match self {
            Self::SlotTick(state) | Self::BlockImport(state) => state,
        }
    }

    fn is_block_import(&self) -> bool {
        matches!(self, Self::BlockImport(_))
    }
}

struct ScheduledAttestation {
    due_millis: u64,
    slot: Slot,
    validator_index: ValidatorIndex,
    committee_index: CommitteeIndex,
}

/// Owns every locally held validator identity and publishes the blocks/attestations/
/// initialization events named in §6's "Produced streams".
pub struct Scheduler<C: Config> {
    uninitialized: Vec<Arc<dyn Signer>>,
    initialized: HashMap<ValidatorIndex, Arc<dyn Signer>>,
    last_processed_slot: Option<Slot>,
    recent_state: Option<ObservableBeaconState<C>>,
    scheduled_attestations: Vec<ScheduledAttestation>,
    deposit_contract: Arc<dyn DepositContract>,

    proposed_blocks: mpsc::Sender<SignedBeaconBlock<C>>,
    attestations: mpsc::Sender<Attestation<C>>,
    initialized_validators: Option<mpsc::Sender<(ValidatorIndex, PublicKeyBytes)>>,
}

/// The receiving ends of the three produced streams, handed back by [`Scheduler::new`].
pub struct SchedulerStreams<C: Config> {
    pub proposed_blocks: mpsc::Receiver<SignedBeaconBlock<C>>,
    pub attestations: mpsc::Receiver<Attestation<C>>,
    pub initialized_validators: mpsc::Receiver<(ValidatorIndex, PublicKeyBytes)>,
}

impl<C: Config> Scheduler<C> {
    pub fn new(deposit_contract: Arc<dyn DepositContract>) -> (Self, SchedulerStreams<C>) {
        let (proposed_blocks_tx, proposed_blocks_rx) = mpsc::channel();
        let (attestations_tx, attestations_rx) = mpsc::channel();
        let (initialized_validators_tx, initialized_validators_rx) = mpsc::channel();

        let scheduler = Self {
            uninitialized: Vec::new(),
            initialized: HashMap::new(),
            last_processed_slot: None,
            recent_state: None,
            scheduled_attestations: Vec::new(),
            deposit_contract,
            proposed_blocks: proposed_blocks_tx,
            attestations: attestations_tx,
            initialized_validators: Some(initialized_validators_tx),
        };
        let streams = SchedulerStreams {
            proposed_blocks: proposed_blocks_rx,
            attestations: attestations_rx,
            initialized_validators: initialized_validators_rx,
        };
        (scheduler, streams)
    }

    /// Registers a validator credential that hasn't yet been matched to a registry index.
    pub fn add_validator(&mut self, signer: Arc<dyn Signer>) {
        self.uninitialized.push(signer);
    }

    /// Delivers a new observable state. Stale deliveries (slot doesn't match the clock) are
    /// silently discarded, matching S4.
    pub fn on_update(&mut self, update: StateUpdate<C>, clock: &impl Clock) -> anyhow::Result<()> {
        let state = update.state();
        let slot = state.latest_slot_state.slot;
        let genesis_time = state.latest_slot_state.genesis_time;

        if !clock.is_current_slot::<C>(slot, genesis_time) {
            return Ok(());
        }

        self.recent_state = Some(state.clone());

        if self.last_processed_slot.map_or(true, |last| slot > last) {
            self.last_processed_slot = Some(slot);
            self.run_duties(slot, update.is_block_import())?;
        }

        Ok(())
    }

    fn run_duties(&mut self, slot: Slot, is_block_import: bool) -> anyhow::Result<()> {
        self.initialize_known_validators();

        let state = self
            .recent_state
            .as_ref()
            .expect("run_duties is only called right after recent_state is set");

        if !is_block_import && slot != C::genesis_slot() {
            let proposer_index = get_beacon_proposer_index(&state.latest_slot_state)
                .map_err(DebugAsError::new)?;
            if let Some(signer) = self.initialized.get(&proposer_index) {
                let block = proposer::propose(
                    state,
                    signer.as_ref(),
                    self.deposit_contract.as_ref(),
                );
                // A disconnected receiver just means nobody is listening for proposals; the duty
                // itself still ran.
                let _ = self.proposed_blocks.send(block);
            }
        }

        let committee_count = get_committee_count_at_slot(&state.latest_slot_state, slot)
            .map_err(DebugAsError::new)?;
        let midpoint_millis = Self::slot_midpoint_millis(&state.latest_slot_state, slot);

        for committee_index in 0..committee_count {
            let committee = get_beacon_committee(&state.latest_slot_state, slot, committee_index)
                .map_err(DebugAsError::new)?;
            for validator_index in committee {
                if self.initialized.contains_key(&validator_index) {
                    self.scheduled_attestations.push(ScheduledAttestation {
                        due_millis: midpoint_millis,
                        slot,
                        validator_index,
                        committee_index,
                    });
                }
            }
        }

        Ok(())
    }

    fn slot_midpoint_millis(state: &types::BeaconState<C>, slot: Slot) -> u64 {
        let genesis_millis = state.genesis_time.saturating_mul(1000);
        let slot_start_millis = genesis_millis.saturating_add(slot.saturating_mul(C::seconds_per_slot()).saturating_mul(1000));
        slot_start_millis.saturating_add(C::seconds_per_slot().saturating_mul(1000) / 2)
    }

    fn initialize_known_validators(&mut self) {
        if self.uninitialized.is_empty() {
            return;
        }

        let state = match &self.recent_state {
            Some(state) => state,
            None => return,
        };

        let mut still_uninitialized = Vec::new();
        for signer in self.uninitialized.drain(..) {
            let pubkey = signer.pubkey();
            let found = state
                .latest_slot_state
                .validators
                .iter()
                .position(|validator| validator.pubkey == pubkey);
            match found {
                Some(index) => {
                    let validator_index = index as ValidatorIndex;
                    if let Some(sender) = &self.initialized_validators {
                        let _ = sender.send((validator_index, pubkey));
                    }
                    self.initialized.insert(validator_index, signer);
                }
                None => still_uninitialized.push(signer),
            }
        }
        self.uninitialized = still_uninitialized;

        // The initialization stream completes once every provided credential is bound.
        if self.uninitialized.is_empty() {
            self.initialized_validators = None;
        }
    }

    /// Runs every attestation duty whose scheduled midpoint has passed. Each duty re-reads the
    /// latest observable state and re-checks committee membership before signing, so a re-org
    /// that moved the validator out of its committee causes the duty to be skipped rather than
    /// publishing a stale attestation.
    pub fn run_due_attestations(&mut self, now_millis: u64) -> anyhow::Result<()> {
        let due: Vec<ScheduledAttestation> = {
            let (due, still_pending): (Vec<_>, Vec<_>) = self
                .scheduled_attestations
                .drain(..)
                .partition(|scheduled| scheduled.due_millis <= now_millis);
            self.scheduled_attestations = still_pending;
            due
        };

        for scheduled in due {
            let state = match &self.recent_state {
                Some(state) => state,
                None => continue,
            };
            if state.latest_slot_state.slot != scheduled.slot {
                continue;
            }

            let committee = get_beacon_committee(
                &state.latest_slot_state,
                scheduled.slot,
                scheduled.committee_index,
            )
            .map_err(DebugAsError::new)?;
            if !committee.contains(&scheduled.validator_index) {
                continue;
            }

            let signer = match self.initialized.get(&scheduled.validator_index) {
                Some(signer) => Arc::clone(signer),
                None => continue,
            };

            let attestation = attester::attest(
                scheduled.validator_index,
                scheduled.committee_index,
                state,
                signer.as_ref(),
            )?;
            let _ = self.attestations.send(attestation);
        }

        Ok(())
    }
}
