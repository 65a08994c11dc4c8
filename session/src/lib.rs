//! Voting session management.
//!
//! Turns one remote voting contract per poll into a small set of session
//! operations:
//! - [`SessionManager`]: create, restore, and finalize sessions; owns the registry
//! - [`Session`]: query candidates, vote, read the tally, finalize
//! - [`VotingBuilder`]: accumulate a bounded candidate list before creation

pub mod builder;
pub mod error;
pub mod manager;
pub mod outcome;
pub mod registry;
pub mod session;

pub use builder::VotingBuilder;
pub use error::{LookupError, QueryError, SessionError};
pub use manager::{RestorePolicy, SessionManager};
pub use outcome::{FinalizeOutcome, VoteOutcome};
pub use registry::SessionRegistry;
pub use session::Session;
