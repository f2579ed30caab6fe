//! The election ledger: processes operations and maintains state.
//!
//! A single authoritative sequential state machine. Every mutating operation
//! checks all of its preconditions before touching state, so a returned
//! error always means "nothing changed". Serializability comes from the
//! exclusive `&mut self` borrow; there is no internal parallelism.

use crate::snapshot::Snapshot;
use crate::{Address, Ballot, Clock, Contender, Error, Event, LedgerConfig, Phase, StateDigest, Timestamp};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// The election ledger.
///
/// The registrar identity and the voting-window duration are fixed at
/// construction. Contenders are indexed both by address and by code; the
/// indexes point into a single canonical list kept in registration order.
pub struct Ledger {
    /// The single privileged identity.
    registrar: Address,

    /// Window length in seconds, applied when voting starts.
    voting_duration: Timestamp,

    /// Lifecycle stage. Strictly forward-moving.
    phase: Phase,

    /// Set exactly once, when voting starts.
    start_time: Option<Timestamp>,

    /// Derived: `start_time + voting_duration`. Never independently set.
    end_time: Option<Timestamp>,

    /// Canonical contender list, in registration order.
    contenders: Vec<Contender>,

    /// Address index into `contenders`.
    by_address: BTreeMap<Address, usize>,

    /// Code index into `contenders`.
    by_code: BTreeMap<String, usize>,

    /// Ballot table. Presence of an entry is the "has voted" flag.
    ballots: BTreeMap<Address, Ballot>,

    /// Winner set, stored when voting ends. Registration order.
    winners: Vec<Address>,

    /// The winning vote count, stored when voting ends.
    highest_votes: u64,

    /// Notification log (in order of emission).
    events: Vec<Event>,

    /// Time source sampled at the top of each phase-sensitive operation.
    clock: Box<dyn Clock>,
}

impl Ledger {
    /// Create a new ledger with the given config and clock.
    pub fn new(config: LedgerConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            registrar: config.registrar,
            voting_duration: config.voting_duration,
            phase: Phase::NotStarted,
            start_time: None,
            end_time: None,
            contenders: Vec::new(),
            by_address: BTreeMap::new(),
            by_code: BTreeMap::new(),
            ballots: BTreeMap::new(),
            winners: Vec::new(),
            highest_votes: 0,
            events: Vec::new(),
            clock,
        }
    }

    // =========================================================================
    // Mutating operations
    // =========================================================================

    /// Register a single contender. Registrar-only, before voting starts.
    pub fn register_contender(
        &mut self,
        caller: Address,
        address: Address,
        code: &str,
    ) -> Result<(), Error> {
        self.ensure_registrar(caller)?;
        self.ensure_not_started()?;
        self.check_registration(address, code)?;

        self.insert_contender(address, code.to_string());
        Ok(())
    }

    /// Register a batch of contenders, all-or-nothing.
    ///
    /// Every pair is validated (including against earlier pairs in the same
    /// batch) before anything is inserted, so a duplicate code inside the
    /// batch fails the whole call with no partial registration.
    pub fn register_contenders(
        &mut self,
        caller: Address,
        addresses: &[Address],
        codes: &[String],
    ) -> Result<(), Error> {
        self.ensure_registrar(caller)?;
        self.ensure_not_started()?;

        if addresses.len() != codes.len() {
            return Err(Error::InvalidArgument("arrays length mismatch".to_string()));
        }
        if addresses.is_empty() {
            return Err(Error::InvalidArgument("no contenders provided".to_string()));
        }

        let mut batch_addresses = BTreeSet::new();
        let mut batch_codes = BTreeSet::new();
        for (address, code) in addresses.iter().zip(codes) {
            self.check_registration(*address, code)?;
            if !batch_addresses.insert(*address) {
                return Err(Error::Conflict(format!(
                    "contender already registered: {address}"
                )));
            }
            if !batch_codes.insert(code.as_str()) {
                return Err(Error::Conflict(format!("code already exists: {code}")));
            }
        }

        for (address, code) in addresses.iter().zip(codes) {
            self.insert_contender(*address, code.clone());
        }
        Ok(())
    }

    /// Open the voting window. Registrar-only, exactly once.
    pub fn start_voting(&mut self, caller: Address) -> Result<(), Error> {
        self.ensure_registrar(caller)?;
        self.ensure_not_started()?;
        if self.contenders.is_empty() {
            return Err(Error::PhaseViolation("no contenders registered"));
        }

        let now = self.clock.now();
        let end = now + self.voting_duration;
        self.start_time = Some(now);
        self.end_time = Some(end);
        self.phase = Phase::Active;
        self.events.push(Event::VotingStarted { start: now, end });

        info!(start = now, end, "voting started");
        Ok(())
    }

    /// Cast a vote for the contender with the given code.
    ///
    /// One vote per address. Lapse is time-based: a vote after `end_time`
    /// fails with [`Error::WindowExpired`] even if `end_voting` has not been
    /// called yet. A vote at exactly `end_time` is still accepted.
    pub fn vote(&mut self, caller: Address, code: &str) -> Result<(), Error> {
        // An active phase always carries a set window; refuse to guess if
        // that coupling is ever broken.
        let (Phase::Active, Some(end)) = (self.phase, self.end_time) else {
            return Err(Error::PhaseViolation("voting is not active"));
        };

        let now = self.clock.now();
        if now > end {
            return Err(Error::WindowExpired { now, end });
        }

        if self.ballots.contains_key(&caller) {
            return Err(Error::AlreadyVoted(caller));
        }

        let index = *self
            .by_code
            .get(code)
            .ok_or_else(|| Error::NotFound(format!("invalid contender code: {code}")))?;

        let contender = &mut self.contenders[index];
        contender.votes += 1;
        let chosen = contender.address;
        self.ballots.insert(caller, Ballot { contender: chosen, at: now });
        self.events.push(Event::VoteAccepted {
            voter: caller,
            contender: chosen,
            code: code.to_string(),
        });

        debug!(voter = %caller, code, "vote accepted");
        Ok(())
    }

    /// Close the voting window and compute the winner set. Registrar-only.
    ///
    /// The window must have fully elapsed; ending early is rejected even for
    /// the registrar. Ties are reported as co-winners in registration order,
    /// never broken.
    pub fn end_voting(&mut self, caller: Address) -> Result<(), Error> {
        self.ensure_registrar(caller)?;
        let (Phase::Active, Some(end)) = (self.phase, self.end_time) else {
            return Err(Error::PhaseViolation("voting is not active"));
        };

        let now = self.clock.now();
        if now < end {
            return Err(Error::PhaseViolation("voting period not ended"));
        }

        let (winners, highest_votes) = self.compute_winners();
        self.phase = Phase::Ended;
        self.winners = winners.clone();
        self.highest_votes = highest_votes;
        self.events.push(Event::VotingEnded {
            winners,
            highest_votes,
        });

        info!(
            winners = self.winners.len(),
            highest_votes, "voting ended"
        );
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The registrar identity.
    pub fn registrar(&self) -> Address {
        self.registrar
    }

    /// The current lifecycle stage.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the voting window is open (phase flag; ignores expiry).
    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Whether voting has ended.
    pub fn has_ended(&self) -> bool {
        self.phase.has_ended()
    }

    /// When voting started, if it has.
    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }

    /// When the window closes, if voting started.
    pub fn end_time(&self) -> Option<Timestamp> {
        self.end_time
    }

    /// All contenders, in registration order.
    pub fn contenders(&self) -> &[Contender] {
        &self.contenders
    }

    /// All contender addresses, in registration order.
    pub fn contender_addresses(&self) -> Vec<Address> {
        self.contenders.iter().map(|c| c.address).collect()
    }

    /// Parallel address and vote-count arrays, in registration order.
    pub fn vote_counts(&self) -> (Vec<Address>, Vec<u64>) {
        let addresses = self.contender_addresses();
        let votes = self.contenders.iter().map(|c| c.votes).collect();
        (addresses, votes)
    }

    /// Look up a contender by code.
    pub fn contender_by_code(&self, code: &str) -> Result<&Contender, Error> {
        self.by_code
            .get(code)
            .map(|&i| &self.contenders[i])
            .ok_or_else(|| Error::NotFound(format!("contender not found: {code}")))
    }

    /// Look up a contender by address.
    ///
    /// Not-found is a distinct outcome from an existing contender with zero
    /// votes.
    pub fn contender_by_address(&self, address: Address) -> Result<&Contender, Error> {
        self.by_address
            .get(&address)
            .map(|&i| &self.contenders[i])
            .ok_or_else(|| Error::NotFound(format!("contender not found: {address}")))
    }

    /// Whether the given address has voted.
    pub fn has_voted(&self, voter: Address) -> bool {
        self.ballots.contains_key(&voter)
    }

    /// The given voter's ballot record, if set.
    pub fn ballot(&self, voter: Address) -> Option<&Ballot> {
        self.ballots.get(&voter)
    }

    /// Whether the window has lapsed (`now > end_time`). Valid once started.
    pub fn has_expired(&self) -> Result<bool, Error> {
        let end = self
            .end_time
            .ok_or(Error::PhaseViolation("voting has not started"))?;
        Ok(self.clock.now() > end)
    }

    /// Seconds left in the window, floored at zero. Valid once started.
    pub fn time_remaining(&self) -> Result<Timestamp, Error> {
        let end = self
            .end_time
            .ok_or(Error::PhaseViolation("voting has not started"))?;
        Ok(end.saturating_sub(self.clock.now()))
    }

    /// The winner set and the winning vote count. Valid only once ended.
    pub fn winners(&self) -> Result<(&[Address], u64), Error> {
        if !self.phase.has_ended() {
            return Err(Error::PhaseViolation("voting has not ended"));
        }
        Ok((&self.winners, self.highest_votes))
    }

    /// The notification log, in order of emission.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Digest of the ledger's durable state (everything except the clock and
    /// the event log). Changes exactly when a mutating operation succeeds.
    pub fn digest(&self) -> StateDigest {
        StateDigest::of(&Snapshot {
            registrar: &self.registrar,
            voting_duration: self.voting_duration,
            phase: self.phase,
            start_time: self.start_time,
            end_time: self.end_time,
            contenders: &self.contenders,
            ballots: &self.ballots,
            winners: &self.winners,
            highest_votes: self.highest_votes,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_registrar(&self, caller: Address) -> Result<(), Error> {
        if caller != self.registrar {
            return Err(Error::Unauthorized(caller));
        }
        Ok(())
    }

    fn ensure_not_started(&self) -> Result<(), Error> {
        if self.phase != Phase::NotStarted {
            return Err(Error::PhaseViolation("voting already started"));
        }
        Ok(())
    }

    /// Validate a single registration pair against the current registry.
    fn check_registration(&self, address: Address, code: &str) -> Result<(), Error> {
        if address.is_zero() {
            return Err(Error::InvalidArgument(
                "invalid contender address".to_string(),
            ));
        }
        if code.is_empty() {
            return Err(Error::InvalidArgument("code cannot be empty".to_string()));
        }
        if self.by_address.contains_key(&address) {
            return Err(Error::Conflict(format!(
                "contender already registered: {address}"
            )));
        }
        if self.by_code.contains_key(code) {
            return Err(Error::Conflict(format!("code already exists: {code}")));
        }
        Ok(())
    }

    /// Append a validated contender and index it both ways.
    fn insert_contender(&mut self, address: Address, code: String) {
        let index = self.contenders.len();
        self.by_address.insert(address, index);
        self.by_code.insert(code.clone(), index);
        self.events.push(Event::ContenderRegistered {
            address,
            code: code.clone(),
        });
        info!(address = %address, code = %code, "contender registered");
        self.contenders.push(Contender {
            address,
            code,
            votes: 0,
        });
    }

    /// Single scan over the canonical list: a strict new maximum clears the
    /// running winner list, an equal value appends to it.
    fn compute_winners(&self) -> (Vec<Address>, u64) {
        let mut highest = 0u64;
        let mut winners = Vec::new();
        for contender in &self.contenders {
            if contender.votes > highest {
                highest = contender.votes;
                winners.clear();
                winners.push(contender.address);
            } else if contender.votes == highest {
                winners.push(contender.address);
            }
        }
        (winners, highest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;

    const REGISTRAR: Address = Address([0xaa; 20]);

    fn addr(n: u8) -> Address {
        Address([n; 20])
    }

    fn ledger_at(clock: &ManualClock) -> Ledger {
        Ledger::new(LedgerConfig::new(REGISTRAR), Box::new(clock.clone()))
    }

    #[test]
    fn winner_scan_keeps_registration_order_on_tie() {
        let clock = ManualClock::at(1_000);
        let mut ledger = ledger_at(&clock);
        for (i, code) in ["C1", "C2", "C3"].iter().enumerate() {
            ledger
                .register_contender(REGISTRAR, addr(i as u8 + 1), code)
                .unwrap();
        }
        ledger.start_voting(REGISTRAR).unwrap();
        ledger.vote(addr(10), "C1").unwrap();
        ledger.vote(addr(11), "C2").unwrap();
        ledger.vote(addr(12), "C1").unwrap();
        ledger.vote(addr(13), "C2").unwrap();
        ledger.vote(addr(14), "C3").unwrap();

        clock.advance(crate::DEFAULT_VOTING_DURATION + 1);
        ledger.end_voting(REGISTRAR).unwrap();

        let (winners, highest) = ledger.winners().unwrap();
        assert_eq!(winners, &[addr(1), addr(2)]);
        assert_eq!(highest, 2);
    }

    #[test]
    fn winner_scan_with_no_votes_ties_everyone() {
        let clock = ManualClock::at(0);
        let mut ledger = ledger_at(&clock);
        ledger.register_contender(REGISTRAR, addr(1), "C1").unwrap();
        ledger.register_contender(REGISTRAR, addr(2), "C2").unwrap();
        ledger.start_voting(REGISTRAR).unwrap();

        clock.advance(crate::DEFAULT_VOTING_DURATION);
        ledger.end_voting(REGISTRAR).unwrap();

        let (winners, highest) = ledger.winners().unwrap();
        assert_eq!(winners, &[addr(1), addr(2)]);
        assert_eq!(highest, 0);
    }

    #[test]
    fn failed_batch_leaves_digest_unchanged() {
        let clock = ManualClock::at(0);
        let mut ledger = ledger_at(&clock);
        let before = ledger.digest();

        let err = ledger
            .register_contenders(
                REGISTRAR,
                &[addr(1), addr(2)],
                &["C1".to_string(), "C1".to_string()],
            )
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(ledger.digest(), before);
        assert!(ledger.contenders().is_empty());
    }

    #[test]
    fn digest_changes_on_accepted_mutation() {
        let clock = ManualClock::at(0);
        let mut ledger = ledger_at(&clock);
        let before = ledger.digest();
        ledger.register_contender(REGISTRAR, addr(1), "C1").unwrap();
        assert_ne!(ledger.digest(), before);
    }

    #[test]
    fn digest_ignores_clock_advance() {
        let clock = ManualClock::at(0);
        let ledger = ledger_at(&clock);
        let before = ledger.digest();
        clock.advance(1_000);
        assert_eq!(ledger.digest(), before);
    }
}
