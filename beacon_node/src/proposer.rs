//! Builds and signs the beacon block for a validator's proposer duty.
//!
//! State transitions require a signed block up front (the outer proposer signature is checked as
//! the very first step of `process_block`), but the signature itself has to cover the finished
//! block's `state_root`. We resolve the ordering the same way a real proposer does: sign a
//! placeholder block to drive the trial state transition, take the resulting `state_root`, then
//! sign the real block once its contents are final.

use helper_functions::{
    beacon_state_accessors::{get_current_epoch, get_domain},
    crypto::hash_tree_root,
};
use transition_functions::blocks::block_processing::process_block;
use typenum::marker_traits::Unsigned;
use types::{
    config::Config,
    primitives::H256,
    types::{BeaconBlock, BeaconBlockBody, SignedBeaconBlock},
};

use crate::{deposit_contract::DepositContract, observable_state::ObservableBeaconState, signer::Signer};

pub fn propose<C: Config>(
    observed: &ObservableBeaconState<C>,
    signer: &dyn Signer,
    deposit_contract: &dyn DepositContract,
) -> SignedBeaconBlock<C> {
    let state = &observed.latest_slot_state;
    let parent_root = hash_tree_root(&state.latest_block_header);

    let epoch = get_current_epoch(state);
    let randao_domain = get_domain(state, C::domain_randao(), None);
    let randao_reveal = signer.sign(&hash_tree_root(&epoch), randao_domain);

    let eth1_data = deposit_contract
        .latest_eth1_data()
        .unwrap_or_else(|| state.eth1_data.clone());

    let deposits = deposit_contract
        .peek_deposits(
            C::MaxDeposits::to_usize(),
            &state.eth1_data,
            &eth1_data,
        )
        .into_iter()
        .map(|info| info.deposit)
        .collect::<Vec<_>>();

    let body = BeaconBlockBody {
        randao_reveal,
        eth1_data,
        proposer_slashings: observed
            .pending_operations
            .proposer_slashings
            .iter()
            .take(C::MaxProposerSlashings::to_usize())
            .cloned()
            .collect::<Vec<_>>()
            .into(),
        attester_slashings: observed
            .pending_operations
            .attester_slashings
            .iter()
            .take(C::MaxAttesterSlashings::to_usize())
            .cloned()
            .collect::<Vec<_>>()
            .into(),
        attestations: observed
            .pending_operations
            .attestations
            .iter()
            .take(C::MaxAttestations::to_usize())
            .cloned()
            .collect::<Vec<_>>()
            .into(),
        deposits: deposits.into(),
        voluntary_exits: observed
            .pending_operations
            .voluntary_exits
            .iter()
            .take(C::MaxVoluntaryExits::to_usize())
            .cloned()
            .collect::<Vec<_>>()
            .into(),
        ..BeaconBlockBody::default()
    };

    let mut block = BeaconBlock {
        slot: state.slot,
        parent_root,
        state_root: H256::zero(),
        body,
    };

    let proposer_domain = get_domain(state, C::domain_beacon_proposer(), None);
    let trial_signature = signer.sign(&hash_tree_root(&block), proposer_domain);
    let mut trial_state = state.clone();
    process_block(
        &mut trial_state,
        &SignedBeaconBlock {
            message: block.clone(),
            signature: trial_signature,
        },
    );
    block.state_root = hash_tree_root(&trial_state);

    let signature = signer.sign(&hash_tree_root(&block), proposer_domain);
    SignedBeaconBlock {
        message: block,
        signature,
    }
}

#[cfg(test)]
mod tests {
    use bls::SecretKey;
    use ssz_types::VariableList;
    use types::{
        config::{Config, MainnetConfig},
        types::{Eth1Data, Validator},
    };

    use super::*;
    use crate::{
        deposit_contract::{ChainStart, FixedDepositContract},
        observable_state::PendingOperations,
        signer::LocalSigner,
    };

    #[test]
    fn produced_block_state_root_matches_trial_transition() {
        let secret_key = SecretKey::random();
        let signer = LocalSigner::new(secret_key.clone());

        let validator = Validator {
            pubkey: signer.pubkey(),
            effective_balance: MainnetConfig::max_effective_balance(),
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            exit_epoch: MainnetConfig::far_future_epoch(),
            withdrawable_epoch: MainnetConfig::far_future_epoch(),
            ..Validator::default()
        };

        let state = types::BeaconState::<MainnetConfig> {
            validators: VariableList::from(vec![validator]),
            balances: VariableList::from(vec![MainnetConfig::max_effective_balance()]),
            ..types::BeaconState::default()
        };

        let observed = ObservableBeaconState {
            head_block: SignedBeaconBlock::default(),
            latest_slot_state: state,
            pending_operations: PendingOperations::new(),
        };

        let deposit_contract = FixedDepositContract::new(
            ChainStart {
                genesis_time: 0,
                eth1_data: Eth1Data::default(),
                deposits: Vec::new(),
            },
            Vec::new(),
        );

        let block = propose(&observed, &signer, &deposit_contract);

        let mut post_state = observed.latest_slot_state.clone();
        process_block(&mut post_state, &block);

        assert_eq!(block.message.state_root, hash_tree_root(&post_state));
    }
}
