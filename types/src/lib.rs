//! Fundamental types for votebox.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! user ids, contract addresses, candidates, tallies, and the byte codec used to
//! hand a candidate list to the voting contract's constructor.

pub mod candidate;
pub mod codec;
pub mod error;
pub mod id;
pub mod tally;

pub use alloy_primitives::{Address, Bytes, TxHash};
pub use candidate::{Candidate, CandidateList, MAX_CANDIDATES, MAX_CANDIDATE_LEN};
pub use error::{EncodingError, ValidationError};
pub use id::UserId;
pub use tally::TallyEntry;
