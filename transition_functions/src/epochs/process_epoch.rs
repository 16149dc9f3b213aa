use helper_functions::{
    beacon_state_accessors::{
        get_block_root, get_current_epoch, get_previous_epoch, get_randao_mix,
        get_total_active_balance, get_validator_churn_limit,
    },
    beacon_state_mutators::{decrease_balance, initiate_validator_exit},
    crypto::hash_tree_root,
    misc::compute_activation_exit_epoch,
    predicates::is_active_validator,
};
use itertools::{Either, Itertools};
use ssz_types::VariableList;
use std::{cmp, mem};
use typenum::marker_traits::Unsigned;
use types::consts::{JustificationBitsLength, GENESIS_EPOCH};
use types::primitives::{Epoch, Gwei};
use types::types::{Checkpoint, HistoricalBatch};
use types::{beacon_state::BeaconState, config::Config, types::Validator};

use crate::attestations::AttestableBlock;
use crate::rewards_and_penalties::StakeholderBlock;

/// Composes the full per-epoch transition in specification order.
pub fn process_epoch<T: Config>(state: &mut BeaconState<T>) {
    process_justification_and_finalization(state);
    state.process_rewards_and_penalties();
    process_registry_updates(state);
    process_slashings(state);
    process_final_updates(state);
}

fn process_justification_and_finalization<T: Config>(state: &mut BeaconState<T>) {
    let current_epoch = get_current_epoch(state);
    if current_epoch <= GENESIS_EPOCH + 1 {
        return;
    }

    let previous_epoch = get_previous_epoch(state);
    let old_previous_justified_checkpoint = state.previous_justified_checkpoint;
    let old_current_justified_checkpoint = state.current_justified_checkpoint;

    // Process justifications
    state.previous_justified_checkpoint = state.current_justified_checkpoint;
    for i in (1..JustificationBitsLength::to_usize()).rev() {
        let bit = state.justification_bits.get(i - 1).expect("in range");
        state
            .justification_bits
            .set(i, bit)
            .expect("in range");
    }
    state.justification_bits.set(0, false).expect("in range");

    let total_active_balance = get_total_active_balance(state).expect("total balance");

    let matching_target_attestations =
        state.get_matching_target_attestations(previous_epoch);
    let attesting_balance = state.get_attesting_balance(matching_target_attestations);
    if attesting_balance * 3 >= total_active_balance * 2 {
        state.current_justified_checkpoint = Checkpoint {
            epoch: previous_epoch,
            root: get_block_root(state, previous_epoch).expect("block root"),
        };
        state.justification_bits.set(1, true).expect("in range");
    }

    let matching_target_attestations = state.get_matching_target_attestations(current_epoch);
    let attesting_balance = state.get_attesting_balance(matching_target_attestations);
    if attesting_balance * 3 >= total_active_balance * 2 {
        state.current_justified_checkpoint = Checkpoint {
            epoch: current_epoch,
            root: get_block_root(state, current_epoch).expect("block root"),
        };
        state.justification_bits.set(0, true).expect("in range");
    }

    // Process finalizations
    let bit = |i: usize| state.justification_bits.get(i).expect("in range");

    // The 2nd/3rd/4th most recent epochs are justified, the 2nd using the 4th as source
    if bit(1) && bit(2) && bit(3) && old_previous_justified_checkpoint.epoch + 3 == current_epoch {
        state.finalized_checkpoint = old_previous_justified_checkpoint;
    }
    // The 2nd/3rd most recent epochs are justified, the 2nd using the 3rd as source
    if bit(1) && bit(2) && old_previous_justified_checkpoint.epoch + 2 == current_epoch {
        state.finalized_checkpoint = old_previous_justified_checkpoint;
    }
    // The 1st/2nd/3rd most recent epochs are justified, the 1st using the 3rd as source
    if bit(0) && bit(1) && bit(2) && old_current_justified_checkpoint.epoch + 2 == current_epoch {
        state.finalized_checkpoint = old_current_justified_checkpoint;
    }
    // The 1st/2nd most recent epochs are justified, the 1st using the 2nd as source
    if bit(0) && bit(1) && old_current_justified_checkpoint.epoch + 1 == current_epoch {
        state.finalized_checkpoint = old_current_justified_checkpoint;
    }
}

fn process_registry_updates<T: Config>(state: &mut BeaconState<T>) {
    let state_copy = state.clone();

    let is_eligible = |validator: &Validator| {
        validator.activation_eligibility_epoch == T::far_future_epoch()
            && validator.effective_balance == T::max_effective_balance()
    };

    let is_exiting_validator = |validator: &Validator| {
        is_active_validator(validator, get_current_epoch(&state_copy))
            && validator.effective_balance <= T::ejection_balance()
    };

    let (eligible, exiting): (Vec<_>, Vec<_>) = state
        .validators
        .iter_mut()
        .enumerate()
        .filter(|(_, validator)| is_eligible(validator) || is_exiting_validator(validator))
        .partition_map(|(i, validator)| {
            if is_eligible(validator) {
                Either::Left(i)
            } else {
                Either::Right(i)
            }
        });

    for index in eligible {
        state.validators[index].activation_eligibility_epoch = get_current_epoch(&state_copy);
    }
    for index in exiting {
        initiate_validator_exit(state, index as u64).expect("exit error");
    }

    // Queue validators eligible for activation and not dequeued for activation prior to finalized epoch
    let activation_queue = state
        .validators
        .iter()
        .enumerate()
        .filter(|(_, validator)| {
            validator.activation_eligibility_epoch != T::far_future_epoch()
                && validator.activation_epoch
                    >= compute_activation_exit_epoch::<T>(state.finalized_checkpoint.epoch)
        })
        .sorted_by_key(|(_, validator)| validator.activation_eligibility_epoch)
        .map(|(i, _)| i)
        .collect_vec();
    // Dequeue validators for activation up to churn limit (without resetting activation epoch)

    let churn_limit = get_validator_churn_limit(&state).expect("churn limit");
    let delayed_activation_epoch = compute_activation_exit_epoch::<T>(get_current_epoch(&state));
    for index in activation_queue.into_iter().take(churn_limit as usize) {
        let validator = &mut state.validators[index];
        if validator.activation_epoch == T::far_future_epoch() {
            validator.activation_epoch = delayed_activation_epoch;
        }
    }
}

fn process_slashings<T: Config>(state: &mut BeaconState<T>) {
    let epoch = get_current_epoch(state);
    let total_balance = get_total_active_balance(state).expect("total balance");
    let slashings_sum = state.slashings.iter().sum::<u64>();
    let increment = T::effective_balance_increment();

    let penalties: Vec<(u64, Gwei)> = state
        .validators
        .iter()
        .enumerate()
        .filter(|(_, validator)| {
            validator.slashed
                && epoch + T::epochs_per_slashings_vector() / 2 == validator.withdrawable_epoch
        })
        .map(|(index, validator)| {
            let penalty_numerator =
                validator.effective_balance / increment * cmp::min(slashings_sum * 3, total_balance);
            let penalty = penalty_numerator / total_balance * increment;
            (index as u64, penalty)
        })
        .collect();

    for (index, penalty) in penalties {
        decrease_balance(state, index, penalty).expect("balance error");
    }
}

fn process_final_updates<T: Config>(state: &mut BeaconState<T>) {
    let current_epoch = get_current_epoch(&*state);
    let next_epoch = current_epoch + 1 as Epoch;
    //# Reset eth1 data votes
    if (state.slot + 1) % T::SlotsPerEth1VotingPeriod::to_u64() == 0 {
        state.eth1_data_votes = VariableList::from(vec![]);
    }
    //# Update effective balances with hysteresis
    for (index, validator) in state.validators.iter_mut().enumerate() {
        let balance = state.balances[index];
        let half_increment = T::effective_balance_increment() / 2;
        if balance < validator.effective_balance
            || validator.effective_balance + 3 * half_increment < balance
        {
            validator.effective_balance = cmp::min(
                balance - balance % T::effective_balance_increment(),
                T::max_effective_balance(),
            );
        }
    }

    //# Reset slashings
    state.slashings[(next_epoch % T::epochs_per_slashings_vector()) as usize] = 0 as Gwei;
    //# Set randao mix
    state.randao_mixes[(next_epoch % T::EpochsPerHistoricalVector::to_u64()) as usize] =
        get_randao_mix(&*state, current_epoch).expect("randao mix");
    //# Set historical root accumulator
    if next_epoch % (T::slots_per_historical_root() / T::slots_per_epoch()) == 0 {
        let historical_batch = HistoricalBatch::<T> {
            block_roots: state.block_roots.clone(),
            state_roots: state.state_roots.clone(),
        };
        state
            .historical_roots
            .push(hash_tree_root(&historical_batch))
            .expect("push error");
    }
    //# Rotate current/previous epoch attestations
    state.previous_epoch_attestations = mem::replace(
        &mut state.current_epoch_attestations,
        VariableList::from(vec![]),
    );
}
