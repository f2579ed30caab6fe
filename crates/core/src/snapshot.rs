//! Durable-state snapshots and their digests.
//!
//! A snapshot captures exactly the fields that survive across operations
//! (registrar, window, registry, ballots, winners) — not the clock and not
//! the event log. Its digest therefore changes exactly when a mutating
//! operation succeeds, which is what a polling observer needs for cheap
//! change detection.

use crate::{Address, Ballot, Contender, Phase, Timestamp};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A borrowed view of the ledger's durable state, in field order.
#[derive(Serialize)]
pub(crate) struct Snapshot<'a> {
    pub registrar: &'a Address,
    pub voting_duration: Timestamp,
    pub phase: Phase,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub contenders: &'a [Contender],
    pub ballots: &'a BTreeMap<Address, Ballot>,
    pub winners: &'a [Address],
    pub highest_votes: u64,
}

/// A 32-byte BLAKE3 digest over a snapshot's canonical CBOR encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateDigest([u8; 32]);

impl StateDigest {
    pub(crate) fn of(snapshot: &Snapshot<'_>) -> Self {
        let mut buf = Vec::new();
        ciborium::into_writer(snapshot, &mut buf).expect("serialization should not fail");
        Self(*blake3::hash(&buf).as_bytes())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for byte in &self.0 {
            s.push_str(&format!("{:02x}", byte));
        }
        s
    }
}

impl fmt::Debug for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateDigest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_snapshot<'a>(
        registrar: &'a Address,
        ballots: &'a BTreeMap<Address, Ballot>,
    ) -> Snapshot<'a> {
        Snapshot {
            registrar,
            voting_duration: 60,
            phase: Phase::NotStarted,
            start_time: None,
            end_time: None,
            contenders: &[],
            ballots,
            winners: &[],
            highest_votes: 0,
        }
    }

    #[test]
    fn digest_deterministic() {
        let registrar = Address([0xaa; 20]);
        let ballots = BTreeMap::new();
        let d1 = StateDigest::of(&empty_snapshot(&registrar, &ballots));
        let d2 = StateDigest::of(&empty_snapshot(&registrar, &ballots));
        assert_eq!(d1, d2);
    }

    #[test]
    fn digest_covers_every_field() {
        let registrar = Address([0xaa; 20]);
        let ballots = BTreeMap::new();
        let base = StateDigest::of(&empty_snapshot(&registrar, &ballots));

        let mut changed = empty_snapshot(&registrar, &ballots);
        changed.phase = Phase::Active;
        changed.start_time = Some(100);
        changed.end_time = Some(160);
        assert_ne!(StateDigest::of(&changed), base);

        let other_registrar = Address([0xbb; 20]);
        assert_ne!(
            StateDigest::of(&empty_snapshot(&other_registrar, &ballots)),
            base
        );
    }

    #[test]
    fn hex_is_64_lowercase_chars() {
        let registrar = Address([0x01; 20]);
        let ballots = BTreeMap::new();
        let hex = StateDigest::of(&empty_snapshot(&registrar, &ballots)).to_hex();
        assert_eq!(hex.len(), 64);
        assert!(
            hex.chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }
}
