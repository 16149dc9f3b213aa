//! Bridges `Debug`-only error types into `std::error::Error` so they compose with
//! `anyhow`/`thiserror` call chains via `?` without every leaf crate needing its own
//! `std::error::Error` impl.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
#[error("{0:?}")]
pub struct DebugAsError<E: fmt::Debug>(E);

impl<E: fmt::Debug> DebugAsError<E> {
    pub fn new(error: E) -> Self {
        Self(error)
    }

    pub fn into_inner(self) -> E {
        self.0
    }
}
