//! Error types for ezballot-core.

use thiserror::Error;

use crate::{Address, Timestamp};

/// Core errors.
///
/// Every precondition is checked before any state mutation; a returned error
/// means the operation had no effect.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Caller lacks the required role.
    #[error("only the registrar can call this: {0}")]
    Unauthorized(Address),

    /// Malformed input (zero address, empty code, bad batch shape).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Uniqueness violation in the registry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation attempted in a phase that forbids it.
    #[error("phase violation: {0}")]
    PhaseViolation(&'static str),

    /// Vote attempted after the window lapsed, even though the phase is
    /// still nominally active.
    #[error("voting window expired at {end}, now {now}")]
    WindowExpired { now: Timestamp, end: Timestamp },

    /// Caller's ballot record is already set.
    #[error("already voted: {0}")]
    AlreadyVoted(Address),

    /// Lookup with no matching data.
    #[error("not found: {0}")]
    NotFound(String),
}
