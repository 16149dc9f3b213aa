//! Interface to the Eth1 deposit contract watcher, treated as an opaque external collaborator.
//! The core never talks to an Eth1 node directly; it only consumes `chain_start_event`,
//! `peek_deposits`, `has_deposit_root` and `latest_eth1_data` through this trait.

use types::{
    primitives::{Gwei, UnixSeconds},
    types::{Deposit, Eth1Data},
};

/// The event that starts the chain: a genesis time, the Eth1 data it was observed under, and the
/// deposits accumulated up to that point.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainStart {
    pub genesis_time: UnixSeconds,
    pub eth1_data: Eth1Data,
    pub deposits: Vec<Deposit>,
}

/// A single deposit as seen by the watcher, carrying the eth1 block hash it was observed in so
/// the proposer can bound `peek_deposits` by a half-open `(from, to]` eth1-data range.
#[derive(Clone, Debug, PartialEq)]
pub struct DepositInfo {
    pub deposit: Deposit,
    pub amount: Gwei,
    pub block_hash: types::primitives::H256,
}

pub trait DepositContract: Send + Sync {
    fn chain_start_event(&self) -> Option<ChainStart>;

    fn peek_deposits(
        &self,
        max_count: usize,
        from_eth1_data_exclusive: &Eth1Data,
        to_eth1_data_inclusive: &Eth1Data,
    ) -> Vec<DepositInfo>;

    fn has_deposit_root(&self, block_hash: types::primitives::H256, deposit_root: types::primitives::H256) -> bool;

    fn latest_eth1_data(&self) -> Option<Eth1Data>;
}

/// An in-memory oracle that replays a fixed `ChainStart` and deposit list. Used by the emulator
/// and by tests that need a deterministic deposit source (see `S1`/`S6`).
pub struct FixedDepositContract {
    chain_start: ChainStart,
    deposits: Vec<DepositInfo>,
    latest_eth1_data: Eth1Data,
}

impl FixedDepositContract {
    pub fn new(chain_start: ChainStart, deposits: Vec<DepositInfo>) -> Self {
        let latest_eth1_data = chain_start.eth1_data.clone();
        Self {
            chain_start,
            deposits,
            latest_eth1_data,
        }
    }
}

impl DepositContract for FixedDepositContract {
    fn chain_start_event(&self) -> Option<ChainStart> {
        Some(self.chain_start.clone())
    }

    fn peek_deposits(
        &self,
        max_count: usize,
        from_eth1_data_exclusive: &Eth1Data,
        to_eth1_data_inclusive: &Eth1Data,
    ) -> Vec<DepositInfo> {
        let from_index = from_eth1_data_exclusive.deposit_count as usize;
        let to_index = (to_eth1_data_inclusive.deposit_count as usize).min(self.deposits.len());
        if from_index >= to_index {
            return Vec::new();
        }
        self.deposits[from_index..to_index]
            .iter()
            .take(max_count)
            .cloned()
            .collect()
    }

    fn has_deposit_root(
        &self,
        block_hash: types::primitives::H256,
        deposit_root: types::primitives::H256,
    ) -> bool {
        block_hash == self.latest_eth1_data.block_hash
            && deposit_root == self.latest_eth1_data.deposit_root
    }

    fn latest_eth1_data(&self) -> Option<Eth1Data> {
        Some(self.latest_eth1_data.clone())
    }
}
