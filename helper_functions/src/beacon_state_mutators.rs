use std::cmp;
use std::convert::TryFrom;

use types::{beacon_state::BeaconState, config::Config, primitives::*};

use crate::{
    beacon_state_accessors::{get_beacon_proposer_index, get_current_epoch, get_validator_churn_limit},
    error::Error,
    misc::compute_activation_exit_epoch,
};

pub fn increase_balance<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<(), Error> {
    let id = usize::try_from(index).map_err(|_| Error::ConversionToUsize)?;
    state.balances[id] += delta;
    Ok(())
}

pub fn decrease_balance<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
    delta: Gwei,
) -> Result<(), Error> {
    let id = usize::try_from(index).map_err(|_| Error::ConversionToUsize)?;
    state.balances[id] = if delta > state.balances[id] {
        0
    } else {
        state.balances[id] - delta
    };
    Ok(())
}

/// Queues a validator for exit, advancing `exit_epoch` past the last epoch any other
/// validator in this state is already scheduled to exit, subject to the churn limit.
pub fn initiate_validator_exit<C: Config>(
    state: &mut BeaconState<C>,
    index: ValidatorIndex,
) -> Result<(), Error> {
    let id = usize::try_from(index).map_err(|_| Error::ConversionToUsize)?;

    if state.validators[id].exit_epoch != C::far_future_epoch() {
        return Ok(());
    }

    let delayed_epoch = compute_activation_exit_epoch::<C>(get_current_epoch(state));
    let exit_queue_epoch = state
        .validators
        .iter()
        .map(|validator| validator.exit_epoch)
        .filter(|epoch| *epoch != C::far_future_epoch())
        .max()
        .map_or(delayed_epoch, |epoch| cmp::max(epoch, delayed_epoch));

    let exit_queue_churn = state
        .validators
        .iter()
        .filter(|validator| validator.exit_epoch == exit_queue_epoch)
        .count() as u64;

    let exit_queue_epoch = if exit_queue_churn >= get_validator_churn_limit(state)? {
        exit_queue_epoch + 1
    } else {
        exit_queue_epoch
    };

    let validator = &mut state.validators[id];
    validator.exit_epoch = exit_queue_epoch;
    validator.withdrawable_epoch = validator.exit_epoch + C::min_validator_withdrawability_delay();

    Ok(())
}

/// Slashes `slashed_index`, rewarding the proposer and a whistleblower (the proposer, unless
/// another index is given) out of the slashed validator's effective balance.
pub fn slash_validator<C: Config>(
    state: &mut BeaconState<C>,
    slashed_index: ValidatorIndex,
    whistleblower_index: Option<ValidatorIndex>,
) -> Result<(), Error> {
    let epoch = get_current_epoch(state);
    initiate_validator_exit(state, slashed_index)?;

    let id = usize::try_from(slashed_index).map_err(|_| Error::ConversionToUsize)?;
    let effective_balance = state.validators[id].effective_balance;
    state.validators[id].slashed = true;
    state.validators[id].withdrawable_epoch = cmp::max(
        state.validators[id].withdrawable_epoch,
        epoch + C::epochs_per_slashings_vector(),
    );

    let slashings_index = usize::try_from(epoch % C::epochs_per_slashings_vector())
        .map_err(|_| Error::ConversionToUsize)?;
    state.slashings[slashings_index] += effective_balance;
    decrease_balance(
        state,
        slashed_index,
        effective_balance / C::min_slashing_penalty_quotient(),
    )?;

    let proposer_index = get_beacon_proposer_index(state)?;
    let whistleblower_index = whistleblower_index.unwrap_or(proposer_index);
    let whistleblower_reward = effective_balance / C::whistleblower_reward_quotient();
    let proposer_reward = whistleblower_reward / C::proposer_reward_quotient();
    increase_balance(state, proposer_index, proposer_reward)?;
    increase_balance(
        state,
        whistleblower_index,
        whistleblower_reward - proposer_reward,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssz_types::VariableList;
    use types::config::MainnetConfig;
    use types::types::Validator;

    #[test]
    fn test_increase_balance() {
        let mut bs: BeaconState<MainnetConfig> = BeaconState {
            balances: VariableList::from(vec![0]),
            ..BeaconState::default()
        };
        increase_balance(&mut bs, 0, 1).expect("in range");
        assert_eq!(bs.balances[0], 1);
    }

    #[test]
    fn test_decrease_balance() {
        let mut bs: BeaconState<MainnetConfig> = BeaconState {
            balances: VariableList::from(vec![5]),
            ..BeaconState::default()
        };
        decrease_balance(&mut bs, 0, 3).expect("in range");
        assert_eq!(bs.balances[0], 2);
    }

    #[test]
    fn test_decrease_balance_to_negative() {
        let mut bs: BeaconState<MainnetConfig> = BeaconState {
            balances: VariableList::from(vec![0]),
            ..BeaconState::default()
        };
        decrease_balance(&mut bs, 0, 1).expect("in range");
        assert_eq!(bs.balances[0], 0);
    }

    #[test]
    fn test_initiate_validator_exit_sets_exit_and_withdrawable_epoch() {
        let v = Validator {
            exit_epoch: MainnetConfig::far_future_epoch(),
            ..Validator::default()
        };
        let mut bs: BeaconState<MainnetConfig> = BeaconState {
            validators: VariableList::from(vec![v]),
            ..BeaconState::default()
        };
        initiate_validator_exit(&mut bs, 0).expect("exit");
        assert_ne!(bs.validators[0].exit_epoch, MainnetConfig::far_future_epoch());
        assert_eq!(
            bs.validators[0].withdrawable_epoch,
            bs.validators[0].exit_epoch + MainnetConfig::min_validator_withdrawability_delay()
        );
    }

    #[test]
    fn test_initiate_validator_exit_is_idempotent() {
        let v = Validator {
            exit_epoch: 7,
            withdrawable_epoch: 20,
            ..Validator::default()
        };
        let mut bs: BeaconState<MainnetConfig> = BeaconState {
            validators: VariableList::from(vec![v]),
            ..BeaconState::default()
        };
        initiate_validator_exit(&mut bs, 0).expect("exit");
        assert_eq!(bs.validators[0].exit_epoch, 7);
        assert_eq!(bs.validators[0].withdrawable_epoch, 20);
    }

    #[test]
    fn test_slash_validator_marks_slashed_and_pays_rewards() {
        let validators = (0..4)
            .map(|_| Validator {
                effective_balance: MainnetConfig::max_effective_balance(),
                exit_epoch: MainnetConfig::far_future_epoch(),
                withdrawable_epoch: MainnetConfig::far_future_epoch(),
                ..Validator::default()
            })
            .collect::<Vec<_>>();
        let mut bs: BeaconState<MainnetConfig> = BeaconState {
            validators: VariableList::from(validators),
            balances: VariableList::from(vec![0; 4]),
            randao_mixes: ssz_types::FixedVector::from(vec![H256::from([3; 32]); 65536]),
            ..BeaconState::default()
        };

        slash_validator(&mut bs, 0, None).expect("slash");
        assert!(bs.validators[0].slashed);
        assert!(bs.balances.iter().sum::<u64>() > 0);
    }
}
