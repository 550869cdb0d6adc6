//! Scan a mailbox, give every sender a folder of its own and keep a SIEVE
//! script on the server that files their future mail there.

pub mod config;
pub mod error;
pub mod model;
pub mod net;
pub mod planner;
pub mod session;
pub mod sieve;

pub use error::Error;
pub use planner::{AutoSieve, CommitSummary, Phase};
