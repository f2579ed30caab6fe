//! Ledger construction parameters.
//!
//! The registrar identity and the voting-window duration are fixed when the
//! ledger is constructed and are not mutable afterwards.

use crate::{Address, Timestamp};
use serde::{Deserialize, Serialize};

/// The default voting-window duration: 7 days, in seconds.
pub const DEFAULT_VOTING_DURATION: Timestamp = 7 * 24 * 60 * 60;

/// Parameters for constructing a ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// The single privileged identity allowed to register contenders and
    /// control the voting window.
    pub registrar: Address,

    /// How long the voting window stays open once started, in seconds.
    pub voting_duration: Timestamp,
}

impl LedgerConfig {
    /// Config with the default 7-day window.
    pub fn new(registrar: Address) -> Self {
        Self {
            registrar,
            voting_duration: DEFAULT_VOTING_DURATION,
        }
    }

    /// Override the voting-window duration.
    pub fn with_duration(mut self, voting_duration: Timestamp) -> Self {
        self.voting_duration = voting_duration;
        self
    }
}
