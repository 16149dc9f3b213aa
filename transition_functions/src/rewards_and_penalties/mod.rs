use crate::attestations::AttestableBlock;
use helper_functions;
use types::consts::*;
use types::{beacon_state::*, config::Config};
// use types::types::*;
use helper_functions::beacon_state_accessors::*;
use helper_functions::beacon_state_mutators::*;
use helper_functions::math::*;
use helper_functions::predicates::*;
use types::primitives::*;

pub trait StakeholderBlock<T>
where
    T: Config,
{
    fn get_base_reward(&self, index: ValidatorIndex) -> Gwei;
    fn get_attestation_deltas(&self) -> (Vec<Gwei>, Vec<Gwei>);
    fn process_rewards_and_penalties(&mut self);
}

impl<T> StakeholderBlock<T> for BeaconState<T>
where
    T: Config,
{
    fn get_base_reward(&self, index: ValidatorIndex) -> Gwei {
        let total_balance =
            get_total_active_balance(self).expect("Error getting total active balance");
        let effective_balance = self.validators[index as usize].effective_balance;
        effective_balance * T::base_reward_factor()
            / integer_squareroot(total_balance)
            / BASE_REWARDS_PER_EPOCH
    }

    fn get_attestation_deltas(&self) -> (Vec<Gwei>, Vec<Gwei>) {
        let previous_epoch = get_previous_epoch(self);
        let total_balance =
            get_total_active_balance(self).expect("Error getting total active balance");
        let mut rewards: Vec<Gwei> = vec![0; self.validators.len()];
        let mut penalties: Vec<Gwei> = vec![0; self.validators.len()];
        let mut eligible_validator_indices: Vec<ValidatorIndex> = Vec::new();

        for (index, v) in self.validators.iter().enumerate() {
            if is_active_validator(v, previous_epoch)
                || (v.slashed && previous_epoch + 1 < v.withdrawable_epoch)
            {
                eligible_validator_indices.push(index as ValidatorIndex);
            }
        }
        //# Micro-incentives for matching FFG source, FFG target, and head
        let matching_source_attestations = self.get_matching_source_attestations(previous_epoch);
        let matching_target_attestations = self.get_matching_target_attestations(previous_epoch);
        let matching_head_attestations = self.get_matching_head_attestations(previous_epoch);
        let vec = vec![
            matching_source_attestations.clone(),
            matching_target_attestations.clone(),
            matching_head_attestations,
        ];

        for attestations in vec.into_iter() {
            let unslashed_attesting_indices = self.get_unslashed_attesting_indices(attestations);
            let attesting_balance = get_total_balance(self, &unslashed_attesting_indices)
                .expect("Error getting total active balance");

            for &index in &eligible_validator_indices {
                if unslashed_attesting_indices.contains(&index) {
                    let temp_var: ValidatorIndex =
                        (self.get_base_reward(index) * attesting_balance) / total_balance;
                    rewards[index as usize] += temp_var;
                } else {
                    penalties[index as usize] += self.get_base_reward(index);
                }
            }
        }

        //# Proposer and inclusion delay micro-rewards
        for index in self
            .get_unslashed_attesting_indices(matching_source_attestations.clone())
            .iter()
        {
            let attestation = matching_source_attestations
                .into_iter()
                .filter(|attestation| {
                    get_attesting_indices(self, &attestation.data, &attestation.aggregation_bits)
                        .expect("get_attesting_indices should succeed")
                        .contains(index)
                })
                .min_by_key(|attestation| attestation.inclusion_delay)
                .expect("at least one matching attestation should exist");

            let proposer_reward = self.get_base_reward(*index) / T::proposer_reward_quotient();
            rewards[attestation.proposer_index as usize] += proposer_reward;
            let max_attester_reward = self.get_base_reward(*index) - proposer_reward;
            rewards[*index as usize] += max_attester_reward / attestation.inclusion_delay;
        }
        //# Inactivity penalty
        let finality_delay = previous_epoch - self.finalized_checkpoint.epoch;
        if finality_delay > T::min_epochs_to_inactivity_penalty() {
            let matching_target_attesting_indices =
                self.get_unslashed_attesting_indices(matching_target_attestations);
            for index in eligible_validator_indices {
                penalties[index as usize] += BASE_REWARDS_PER_EPOCH * self.get_base_reward(index);
                if !(matching_target_attesting_indices.contains(&index)) {
                    penalties[index as usize] +=
                        (self.validators[index as usize].effective_balance * finality_delay)
                            / T::inactivity_penalty_quotient();
                }
            }
        }
        (rewards, penalties)
    }

    fn process_rewards_and_penalties(&mut self) {
        if get_current_epoch(self) == T::genesis_epoch() {
            return;
        }
        let (rewards, penalties) = self.get_attestation_deltas();
        for (index, _) in self.validators.clone().iter_mut().enumerate() {
            increase_balance(self, index as u64, rewards[index]).expect("Balance error");
            decrease_balance(self, index as u64, penalties[index]).expect("Balance error");
        }
    }
}

#[cfg(test)]
mod tests {
    use ssz_types::VariableList;
    use types::{config::MainnetConfig, types::Validator};

    use super::*;

    fn single_validator_state(effective_balance: Gwei) -> BeaconState<MainnetConfig> {
        let validator = Validator {
            effective_balance,
            activation_epoch: 0,
            exit_epoch: MainnetConfig::far_future_epoch(),
            withdrawable_epoch: MainnetConfig::far_future_epoch(),
            ..Validator::default()
        };
        BeaconState::<MainnetConfig> {
            validators: VariableList::from(vec![validator]),
            balances: VariableList::from(vec![effective_balance]),
            ..BeaconState::default()
        }
    }

    #[test]
    fn base_reward_is_proportional_to_effective_balance_over_sqrt_total_balance() {
        // With a single active validator, total_active_balance == effective_balance, so the
        // reward reduces to effective_balance * 64 / sqrt(effective_balance) / 4 == 16 *
        // sqrt(effective_balance). 25 is a perfect square, keeping the expectation exact.
        let state = single_validator_state(25);

        assert_eq!(state.get_base_reward(0), 16 * 5);
    }

    #[test]
    fn genesis_epoch_skips_rewards_and_penalties() {
        let mut state = single_validator_state(MainnetConfig::max_effective_balance());
        let starting_balance = state.balances[0];

        state.process_rewards_and_penalties();

        assert_eq!(state.balances[0], starting_balance);
    }
}
