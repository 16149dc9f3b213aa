//! The read-only view the validator service and its duties (proposer/attester) observe on every
//! slot tick or block import: the current head, the state advanced to the current slot, and the
//! pool of operations waiting to be included in the next proposed block.

use types::{
    config::Config,
    types::{Attestation, AttesterSlashing, ProposerSlashing, SignedBeaconBlock, SignedVoluntaryExit},
    BeaconState,
};

/// Operations gossiped in from the network (or, in the emulator, injected directly) that have
/// not yet been included in a block. The proposer drains these, bounded by the per-block
/// constants, when it builds a candidate block.
#[derive(Clone, Debug, Default)]
pub struct PendingOperations<C: Config> {
    pub proposer_slashings: Vec<ProposerSlashing>,
    pub attester_slashings: Vec<AttesterSlashing<C>>,
    pub attestations: Vec<Attestation<C>>,
    pub voluntary_exits: Vec<SignedVoluntaryExit>,
}

impl<C: Config> PendingOperations<C> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Clone)]
pub struct ObservableBeaconState<C: Config> {
    pub head_block: SignedBeaconBlock<C>,
    pub latest_slot_state: BeaconState<C>,
    pub pending_operations: PendingOperations<C>,
}
