// Lints are currently suppressed to prevent merge conflicts in case our contributors fix their code
// on their own. This attribute should be removed in the future.
#![allow(warnings)]

pub mod beacon_state;
pub mod config;
pub mod consts;
pub mod helper_functions_types;
pub mod primitives;
pub mod types;

pub use crate::beacon_state::{Error as BeaconStateError, *};
