use crate::*;
use epochs::process_epoch::process_epoch;
use helper_functions::crypto::hash_tree_root;
use types::{
    beacon_state::BeaconState,
    config::Config,
    primitives::{Slot, H256},
    types::SignedBeaconBlock,
};

pub fn state_transition<T: Config>(
    state: &mut BeaconState<T>,
    signed_block: &SignedBeaconBlock<T>,
    validate_state_root: bool,
) -> BeaconState<T> {
    let block = &signed_block.message;
    //# Process slots (including those with no blocks) since block
    process_slots(state, block.slot);
    //# Process block
    blocks::block_processing::process_block(state, signed_block);
    //# Validate state root (`validate_state_root == True` in production)
    if validate_state_root {
        assert_eq!(block.state_root, hash_tree_root(state));
    }
    //# Return post-state
    state.clone()
}

pub fn process_slots<T: Config>(state: &mut BeaconState<T>, slot: Slot) {
    assert!(state.slot <= slot);
    while state.slot < slot {
        process_slot(state);
        //# Process epoch on the start slot of the next epoch
        if (state.slot + 1) % T::slots_per_epoch() == 0 {
            process_epoch(state);
        }
        state.slot += 1;
    }
}

fn process_slot<T: Config>(state: &mut BeaconState<T>) {
    // Cache state root
    let previous_state_root = hash_tree_root(state);

    state.state_roots[(state.slot as usize) % (T::slots_per_historical_root() as usize)] =
        previous_state_root;
    // Cache latest block header state root
    if state.latest_block_header.state_root == H256::from([0_u8; 32]) {
        state.latest_block_header.state_root = previous_state_root;
    }
    // Cache block root
    let previous_block_root = hash_tree_root(&state.latest_block_header);
    state.block_roots[(state.slot as usize) % (T::slots_per_historical_root() as usize)] =
        previous_block_root;
}
