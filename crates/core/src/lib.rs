//! ezballot-core: Core types and state machine for the ezballot election
//! ledger.
//!
//! The ledger runs a timed, single-choice election: a registrar registers
//! contenders, opens a fixed-length voting window, each address votes at
//! most once, and once the window has fully elapsed the registrar closes it
//! and the winner set (ties included) becomes final.

mod address;
mod clock;
mod config;
mod contender;
mod error;
mod ledger;
mod snapshot;

pub use address::Address;
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{DEFAULT_VOTING_DURATION, LedgerConfig};
pub use contender::{Ballot, Contender, Event, Phase};
pub use error::Error;
pub use ledger::Ledger;
pub use snapshot::StateDigest;
