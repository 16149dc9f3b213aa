//! Compile-time chain configuration.
//!
//! Anything that bounds the length of an SSZ list or vector has to be known at compile
//! time so `ssz_types::{FixedVector, VariableList}` can size themselves without heap
//! indirection; those live here as `typenum` associated types. Everything else is a
//! plain runtime constant exposed through a method rather than forced through the type
//! system for no benefit.

use std::fmt::Debug;

use typenum::{Unsigned, U1, U128, U16, U16777216, U2048, U4, U4096, U64, U65536, U8, U8192};
use typenum::U1099511627776;

use crate::primitives::{DomainType, Epoch, Gwei, Slot};

pub trait Config: 'static + Default + Debug + Clone + Copy + PartialEq + Eq + Send + Sync {
    type ShardCount: typenum::Unsigned + Clone + Send + Sync;
    type SlotsPerEpoch: typenum::Unsigned + Clone + Send + Sync;
    type SlotsPerHistoricalRoot: typenum::Unsigned + Clone + Send + Sync;
    type SlotsPerEth1VotingPeriod: typenum::Unsigned + Clone + Send + Sync;
    type HistoricalRootsLimit: typenum::Unsigned + Clone + Send + Sync;
    type ValidatorRegistryLimit: typenum::Unsigned + Clone + Send + Sync;
    type EpochsPerHistoricalVector: typenum::Unsigned + Clone + Send + Sync;
    type EpochsPerSlashingsVector: typenum::Unsigned + Clone + Send + Sync;
    type MaxAttestationsPerEpoch: typenum::Unsigned + Clone + Send + Sync;
    type MaxValidatorsPerCommittee: typenum::Unsigned + Clone + Send + Sync;
    type MaxAttestations: typenum::Unsigned + Clone + Send + Sync;
    type MaxAttesterSlashings: typenum::Unsigned + Clone + Send + Sync;
    type MaxDeposits: typenum::Unsigned + Clone + Send + Sync;
    type MaxProposerSlashings: typenum::Unsigned + Clone + Send + Sync;
    type MaxVoluntaryExits: typenum::Unsigned + Clone + Send + Sync;

    fn genesis_slot() -> Slot {
        0
    }

    fn genesis_epoch() -> Epoch {
        0
    }

    fn activation_exit_delay() -> u64 {
        4
    }

    fn churn_limit_quotient() -> u64 {
        65536
    }

    fn min_per_epoch_churn_limit() -> u64 {
        4
    }

    fn shuffle_round_count() -> u64 {
        90
    }

    fn min_seed_lookahead() -> u64 {
        1
    }

    fn min_attestation_inclusion_delay() -> u64 {
        1
    }

    fn min_epochs_to_inactivity_penalty() -> u64 {
        4
    }

    fn persistent_committee_period() -> u64 {
        2048
    }

    fn safe_slots_to_update_justified() -> u64 {
        8
    }

    fn proposer_reward_quotient() -> u64 {
        8
    }

    fn inactivity_penalty_quotient() -> u64 {
        1 << 25
    }

    fn base_reward_factor() -> u64 {
        64
    }

    fn effective_balance_increment() -> Gwei {
        1_000_000_000
    }

    fn ejection_balance() -> Gwei {
        16_000_000_000
    }

    fn max_effective_balance() -> Gwei {
        32_000_000_000
    }

    fn domain_beacon_proposer() -> DomainType {
        0x00
    }

    fn domain_randao() -> DomainType {
        0x01
    }

    fn domain_attestation() -> DomainType {
        0x02
    }

    fn domain_deposit() -> DomainType {
        0x03
    }

    fn domain_voluntary_exit() -> DomainType {
        0x04
    }

    fn far_future_epoch() -> Epoch {
        u64::max_value()
    }

    fn base_rewards_per_epoch() -> u64 {
        crate::consts::BASE_REWARDS_PER_EPOCH
    }

    fn slots_per_epoch() -> Slot {
        Self::SlotsPerEpoch::to_u64()
    }

    fn slots_per_historical_root() -> Slot {
        Self::SlotsPerHistoricalRoot::to_u64()
    }

    fn epochs_per_slashings_vector() -> u64 {
        Self::EpochsPerSlashingsVector::to_u64()
    }

    fn min_slashing_penalty_quotient() -> u64 {
        32
    }

    fn min_validator_withdrawability_delay() -> u64 {
        256
    }

    fn whistleblower_reward_quotient() -> u64 {
        512
    }

    fn seconds_per_slot() -> u64 {
        6
    }
}

/// Mainnet chain constants. Differs from [`MinimalConfig`] only in the sizes that,
/// under the real network, must stay large enough to survive a full deposit queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MainnetConfig;

impl Config for MainnetConfig {
    type ShardCount = U1; // phase 0 sharding is a stub; crosslinks live on a single shard
    type SlotsPerEpoch = U64;
    type SlotsPerHistoricalRoot = U8192;
    type SlotsPerEth1VotingPeriod = U16;
    type HistoricalRootsLimit = U16777216;
    type ValidatorRegistryLimit = U1099511627776Alias;
    type EpochsPerHistoricalVector = U65536;
    type EpochsPerSlashingsVector = U8192;
    type MaxAttestationsPerEpoch = U4096Alias;
    type MaxValidatorsPerCommittee = U2048;
    type MaxAttestations = U128;
    type MaxAttesterSlashings = U1;
    type MaxDeposits = U16;
    type MaxProposerSlashings = U16;
    type MaxVoluntaryExits = U16;
}

/// Small-committee configuration used for fast local networks and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MinimalConfig;

impl Config for MinimalConfig {
    type ShardCount = U1;
    type SlotsPerEpoch = U8;
    type SlotsPerHistoricalRoot = U64;
    type SlotsPerEth1VotingPeriod = U4;
    type HistoricalRootsLimit = U16777216;
    type ValidatorRegistryLimit = U1099511627776Alias;
    type EpochsPerHistoricalVector = U64;
    type EpochsPerSlashingsVector = U64;
    type MaxAttestationsPerEpoch = U4096Alias;
    type MaxValidatorsPerCommittee = U2048;
    type MaxAttestations = U128;
    type MaxAttesterSlashings = U1;
    type MaxDeposits = U16;
    type MaxProposerSlashings = U16;
    type MaxVoluntaryExits = U16;

    fn shuffle_round_count() -> u64 {
        10
    }

    fn safe_slots_to_update_justified() -> u64 {
        2
    }
}

type U1099511627776Alias = typenum::U1099511627776;
type U4096Alias = typenum::U4096;
