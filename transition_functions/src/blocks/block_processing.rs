use std::collections::BTreeSet;

use helper_functions::{
    beacon_state_accessors::{
        get_beacon_committee, get_beacon_proposer_index, get_current_epoch, get_domain,
        get_indexed_attestation, get_previous_epoch, get_randao_mix,
    },
    beacon_state_mutators::{increase_balance, initiate_validator_exit, slash_validator},
    crypto::{bls_verify, hash, hash_tree_root, signed_root},
    math::xor,
    misc::compute_epoch_at_slot,
    predicates::{
        is_active_validator, is_slashable_attestation_data, is_slashable_validator,
        is_valid_merkle_branch, validate_indexed_attestation,
    },
};
use typenum::marker_traits::Unsigned;
use types::{
    beacon_state::BeaconState,
    config::Config,
    consts::DEPOSIT_CONTRACT_TREE_DEPTH,
    types::{
        Attestation, AttesterSlashing, BeaconBlockBody, BeaconBlockHeader, Deposit,
        PendingAttestation, ProposerSlashing, SignedBeaconBlock, SignedVoluntaryExit, Validator,
    },
};

pub fn process_block<T: Config>(state: &mut BeaconState<T>, signed_block: &SignedBeaconBlock<T>) {
    process_block_header(state, signed_block);
    process_randao(state, &signed_block.message.body);
    process_eth1_data(state, &signed_block.message.body);
    process_operations(state, &signed_block.message.body);
}

fn process_block_header<T: Config>(state: &mut BeaconState<T>, signed_block: &SignedBeaconBlock<T>) {
    let block = &signed_block.message;
    assert_eq!(block.slot, state.slot);
    assert_eq!(block.parent_root, hash_tree_root(&state.latest_block_header));

    state.latest_block_header = BeaconBlockHeader {
        slot: block.slot,
        parent_root: block.parent_root,
        state_root: types::primitives::H256::zero(),
        body_root: hash_tree_root(&block.body),
    };

    let proposer_index = get_beacon_proposer_index(state).expect("active validator set");
    let proposer = &state.validators[proposer_index as usize];
    assert!(!proposer.slashed);

    let domain = get_domain(state, T::domain_beacon_proposer(), None);
    assert!(bls_verify(
        &proposer.pubkey,
        hash_tree_root(block).as_bytes(),
        &signed_block.signature,
        domain,
    )
    .unwrap_or(false));
}

fn process_randao<T: Config>(state: &mut BeaconState<T>, body: &BeaconBlockBody<T>) {
    let epoch = get_current_epoch(state);
    let proposer_index = get_beacon_proposer_index(state).expect("active validator set");
    let proposer = &state.validators[proposer_index as usize];

    let domain = get_domain(state, T::domain_randao(), None);
    assert!(bls_verify(
        &proposer.pubkey,
        hash_tree_root(&epoch).as_bytes(),
        &body.randao_reveal,
        domain,
    )
    .unwrap_or(false));

    let mix = xor(
        get_randao_mix(state, epoch)
            .expect("mix in range")
            .as_bytes(),
        &hash(body.randao_reveal.as_bytes()),
    );
    let index = (epoch % T::EpochsPerHistoricalVector::to_u64()) as usize;
    state.randao_mixes[index] = types::primitives::H256::from_slice(&mix);
}

fn process_eth1_data<T: Config>(state: &mut BeaconState<T>, body: &BeaconBlockBody<T>) {
    state
        .eth1_data_votes
        .push(body.eth1_data.clone())
        .expect("eth1 data votes within bound");

    let num_votes = state
        .eth1_data_votes
        .iter()
        .filter(|vote| *vote == &body.eth1_data)
        .count();

    if num_votes * 2 > T::SlotsPerEth1VotingPeriod::to_usize() {
        state.eth1_data = body.eth1_data.clone();
    }
}

fn process_operations<T: Config>(state: &mut BeaconState<T>, body: &BeaconBlockBody<T>) {
    let expected_deposits = std::cmp::min(
        T::MaxDeposits::to_u64(),
        state.eth1_data.deposit_count - state.eth1_deposit_index,
    );
    assert_eq!(body.deposits.len() as u64, expected_deposits);

    for proposer_slashing in body.proposer_slashings.iter() {
        process_proposer_slashing(state, proposer_slashing);
    }
    for attester_slashing in body.attester_slashings.iter() {
        process_attester_slashing(state, attester_slashing);
    }
    for attestation in body.attestations.iter() {
        process_attestation(state, attestation);
    }
    for deposit in body.deposits.iter() {
        process_deposit(state, deposit);
    }
    for voluntary_exit in body.voluntary_exits.iter() {
        process_voluntary_exit(state, voluntary_exit);
    }
}

fn process_proposer_slashing<T: Config>(
    state: &mut BeaconState<T>,
    proposer_slashing: &ProposerSlashing,
) {
    let header_1 = &proposer_slashing.signed_header_1.message;
    let header_2 = &proposer_slashing.signed_header_2.message;

    assert_eq!(header_1.slot, header_2.slot);
    assert_ne!(header_1, header_2);

    let proposer = state.validators[proposer_slashing.proposer_index as usize].clone();
    assert!(is_slashable_validator(&proposer, get_current_epoch(state)));

    for signed_header in &[
        &proposer_slashing.signed_header_1,
        &proposer_slashing.signed_header_2,
    ] {
        let domain = get_domain(
            state,
            T::domain_beacon_proposer(),
            Some(compute_epoch_at_slot::<T>(signed_header.message.slot)),
        );
        assert!(bls_verify(
            &proposer.pubkey,
            hash_tree_root(&signed_header.message).as_bytes(),
            &signed_header.signature,
            domain,
        )
        .unwrap_or(false));
    }

    slash_validator(state, proposer_slashing.proposer_index, None).expect("slashing succeeds");
}

fn process_attester_slashing<T: Config>(
    state: &mut BeaconState<T>,
    attester_slashing: &AttesterSlashing<T>,
) {
    let attestation_1 = &attester_slashing.attestation_1;
    let attestation_2 = &attester_slashing.attestation_2;

    assert!(is_slashable_attestation_data(
        &attestation_1.data,
        &attestation_2.data
    ));
    validate_indexed_attestation(state, attestation_1, true).expect("valid indexed attestation");
    validate_indexed_attestation(state, attestation_2, true).expect("valid indexed attestation");

    let indices_1: BTreeSet<_> = attestation_1
        .custody_bit_0_indices
        .iter()
        .chain(attestation_1.custody_bit_1_indices.iter())
        .cloned()
        .collect();
    let indices_2: BTreeSet<_> = attestation_2
        .custody_bit_0_indices
        .iter()
        .chain(attestation_2.custody_bit_1_indices.iter())
        .cloned()
        .collect();

    let mut slashed_any = false;
    for index in indices_1.intersection(&indices_2) {
        let validator = state.validators[*index as usize].clone();
        if is_slashable_validator(&validator, get_current_epoch(state)) {
            slash_validator(state, *index, None).expect("slashing succeeds");
            slashed_any = true;
        }
    }
    assert!(slashed_any);
}

fn process_attestation<T: Config>(state: &mut BeaconState<T>, attestation: &Attestation<T>) {
    let data = &attestation.data;
    let current_epoch = get_current_epoch(state);
    let previous_epoch = get_previous_epoch(state);

    assert!(data.target.epoch == previous_epoch || data.target.epoch == current_epoch);
    assert_eq!(data.target.epoch, compute_epoch_at_slot::<T>(data.slot));
    assert!(
        data.slot + T::min_attestation_inclusion_delay() <= state.slot
            && state.slot <= data.slot + T::SlotsPerEpoch::to_u64()
    );

    let committee = get_beacon_committee(state, data.slot, data.index).expect("committee exists");
    assert_eq!(attestation.aggregation_bits.len(), committee.len());

    let pending_attestation = PendingAttestation {
        data: data.clone(),
        aggregation_bits: attestation.aggregation_bits.clone(),
        inclusion_delay: state.slot - data.slot,
        proposer_index: get_beacon_proposer_index(state).expect("active validator set"),
    };

    if data.target.epoch == current_epoch {
        assert_eq!(data.source, state.current_justified_checkpoint);
        state
            .current_epoch_attestations
            .push(pending_attestation)
            .expect("attestations within bound");
    } else {
        assert_eq!(data.source, state.previous_justified_checkpoint);
        state
            .previous_epoch_attestations
            .push(pending_attestation)
            .expect("attestations within bound");
    }

    let indexed_attestation =
        get_indexed_attestation(state, attestation).expect("attestation bits match committee");
    validate_indexed_attestation(state, &indexed_attestation, true)
        .expect("valid indexed attestation");
}

fn process_deposit<T: Config>(state: &mut BeaconState<T>, deposit: &Deposit) {
    assert!(is_valid_merkle_branch::<T>(
        &hash_tree_root(&deposit.data),
        &deposit.proof,
        DEPOSIT_CONTRACT_TREE_DEPTH + 1,
        state.eth1_deposit_index,
        &state.eth1_data.deposit_root,
    )
    .unwrap_or(false));

    state.eth1_deposit_index += 1;

    let pubkey = deposit.data.pubkey.clone();
    let amount = deposit.data.amount;

    if let Some(validator) = state.validators.iter().position(|v| v.pubkey == pubkey) {
        increase_balance(state, validator as u64, amount).expect("validator index in range");
        return;
    }

    let domain = helper_functions::beacon_state_accessors::compute_domain(
        T::domain_deposit(),
        types::primitives::Version::default(),
    );
    let signature_valid = bls_verify(
        &pubkey,
        signed_root(&deposit.data).as_bytes(),
        &deposit.data.signature,
        domain,
    )
    .unwrap_or(false);
    if !signature_valid {
        return;
    }

    let effective_balance = std::cmp::min(
        amount - (amount % T::effective_balance_increment()),
        T::max_effective_balance(),
    );

    state
        .validators
        .push(Validator {
            pubkey,
            withdrawal_credentials: deposit.data.withdrawal_credentials,
            activation_eligibility_epoch: T::far_future_epoch(),
            activation_epoch: T::far_future_epoch(),
            exit_epoch: T::far_future_epoch(),
            withdrawable_epoch: T::far_future_epoch(),
            effective_balance,
            slashed: false,
        })
        .expect("validator registry within bound");
    state.balances.push(amount).expect("balances within bound");
}

fn process_voluntary_exit<T: Config>(
    state: &mut BeaconState<T>,
    signed_exit: &SignedVoluntaryExit,
) {
    let exit = &signed_exit.message;
    let validator = state.validators[exit.validator_index as usize].clone();

    assert!(is_active_validator(&validator, get_current_epoch(state)));
    assert_eq!(validator.exit_epoch, T::far_future_epoch());
    assert!(get_current_epoch(state) >= exit.epoch);
    assert!(get_current_epoch(state) >= validator.activation_epoch + T::persistent_committee_period());

    let domain = get_domain(state, T::domain_voluntary_exit(), Some(exit.epoch));
    assert!(bls_verify(
        &validator.pubkey,
        hash_tree_root(exit).as_bytes(),
        &signed_exit.signature,
        domain,
    )
    .unwrap_or(false));

    initiate_validator_exit(state, exit.validator_index).expect("exit queue processed");
}
