//! Errors raised while building a [`Network`](crate::Network).
//!
//! Only construction can fail: empty ids, inverted limits, duplicates and
//! references to unknown buses are rejected. Reading or scaling a network
//! never returns a [`GatError`].

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatError {
    /// Equipment data is malformed (empty id, pmin above pmax)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Equipment does not fit the existing topology (unknown bus, duplicate)
    #[error("Network error: {0}")]
    Network(String),
}

pub type GatResult<T> = Result<T, GatError>;
