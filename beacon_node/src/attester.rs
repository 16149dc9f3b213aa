//! Builds and signs the `Attestation` for a validator's attester duty at a given slot and
//! committee index.

use error_utils::DebugAsError;
use helper_functions::{
    beacon_state_accessors::{get_beacon_committee, get_current_epoch, get_domain},
    crypto::hash_tree_root,
};
use ssz_types::BitList;
use types::{
    config::Config,
    primitives::{CommitteeIndex, ValidatorIndex},
    types::{Attestation, AttestationData, Checkpoint},
};

use crate::{observable_state::ObservableBeaconState, signer::Signer};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("validator {validator_index} is not a member of committee {committee_index} at slot {slot}")]
    NotInCommittee {
        validator_index: ValidatorIndex,
        committee_index: CommitteeIndex,
        slot: types::primitives::Slot,
    },
    #[error(transparent)]
    HelperFunctions(DebugAsError<helper_functions::error::Error>),
}

impl From<helper_functions::error::Error> for Error {
    fn from(error: helper_functions::error::Error) -> Self {
        Self::HelperFunctions(DebugAsError::new(error))
    }
}

/// Produces a signed `Attestation` for `validator_index` in the committee identified by
/// `(state.slot, committee_index)`.
pub fn attest<C: Config>(
    validator_index: ValidatorIndex,
    committee_index: CommitteeIndex,
    observed: &ObservableBeaconState<C>,
    signer: &dyn Signer,
) -> Result<Attestation<C>, Error> {
    let state = &observed.latest_slot_state;

    let committee = get_beacon_committee(state, state.slot, committee_index)?;
    let position_in_committee = committee
        .iter()
        .position(|index| *index == validator_index)
        .ok_or(Error::NotInCommittee {
            validator_index,
            committee_index,
            slot: state.slot,
        })?;

    let beacon_block_root = hash_tree_root(&observed.head_block.message);

    let epoch_boundary_slot =
        helper_functions::misc::compute_start_slot_of_epoch::<C>(get_current_epoch(state));
    let epoch_boundary_root = if state.slot == epoch_boundary_slot {
        beacon_block_root
    } else {
        helper_functions::beacon_state_accessors::get_block_root_at_slot(
            state,
            epoch_boundary_slot,
        )?
    };

    let data = AttestationData {
        slot: state.slot,
        index: committee_index,
        beacon_block_root,
        source: state.current_justified_checkpoint,
        target: Checkpoint {
            epoch: get_current_epoch(state),
            root: epoch_boundary_root,
        },
    };

    let mut aggregation_bits = BitList::with_capacity(committee.len())
        .expect("committee size never exceeds the compile-time committee bound");
    aggregation_bits
        .set(position_in_committee, true)
        .expect("position_in_committee is within the committee's length");

    let domain = get_domain(state, C::domain_attestation(), Some(data.target.epoch));
    let signature = signer.sign(&hash_tree_root(&data), domain);

    Ok(Attestation {
        aggregation_bits,
        data,
        signature,
    })
}
