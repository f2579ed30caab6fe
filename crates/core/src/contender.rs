//! Contender, ballot, phase, and event types.

use crate::{Address, Timestamp};
use serde::{Deserialize, Serialize};

/// A registered contender.
///
/// Created exactly once, before voting starts; never deleted; `votes` is
/// mutated only by accepted votes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contender {
    /// Unique external identity.
    pub address: Address,

    /// Human-readable identifier, globally unique among contenders.
    pub code: String,

    /// Number of accepted votes.
    pub votes: u64,
}

/// A voter's ballot record: set exactly once, never unset.
///
/// Presence of a record in the ballot table is the "has voted" flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// The contender this voter chose.
    pub contender: Address,

    /// When the vote was accepted.
    pub at: Timestamp,
}

/// The election lifecycle stage. Strictly forward-moving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Registration is open; no votes accepted yet.
    #[default]
    NotStarted,
    /// The voting window is open (votes accepted until `end_time` passes).
    Active,
    /// Terminal: winners are computed and queryable.
    Ended,
}

impl Phase {
    pub fn is_active(&self) -> bool {
        matches!(self, Phase::Active)
    }

    pub fn has_ended(&self) -> bool {
        matches!(self, Phase::Ended)
    }
}

/// Notifications emitted synchronously by mutating operations.
///
/// Observers (a UI polling layer, for instance) consume these to refresh
/// cached views; they are not consulted by the ledger itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A contender entered the registry.
    ContenderRegistered { address: Address, code: String },

    /// The voting window opened.
    VotingStarted { start: Timestamp, end: Timestamp },

    /// A vote was accepted.
    VoteAccepted {
        voter: Address,
        contender: Address,
        code: String,
    },

    /// The window closed; winners are final.
    VotingEnded {
        winners: Vec<Address>,
        highest_votes: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_flags() {
        assert!(!Phase::NotStarted.is_active());
        assert!(Phase::Active.is_active());
        assert!(Phase::Ended.has_ended());
        assert_eq!(Phase::default(), Phase::NotStarted);
    }

    #[test]
    fn event_json_roundtrip() {
        let event = Event::VoteAccepted {
            voter: Address([1u8; 20]),
            contender: Address([2u8; 20]),
            code: "C1".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn contender_json_has_named_fields() {
        let contender = Contender {
            address: Address([3u8; 20]),
            code: "C9".to_string(),
            votes: 4,
        };

        let json = serde_json::to_value(&contender).unwrap();
        assert_eq!(json["code"], "C9");
        assert_eq!(json["votes"], 4);
    }
}
