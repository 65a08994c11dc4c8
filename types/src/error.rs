//! Errors raised before anything is sent to the remote environment.

use thiserror::Error;

/// Bad input, rejected locally and synchronously.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("candidate name is empty")]
    EmptyCandidate,

    #[error("candidate name is {len} characters, at most {max} allowed")]
    CandidateTooLong { len: usize, max: usize },

    #[error("candidate name contains the reserved separator byte")]
    SeparatorInCandidate,

    #[error("candidate {0:?} is listed twice")]
    DuplicateCandidate(String),

    #[error("{count} candidates given, at most {max} allowed")]
    TooManyCandidates { count: usize, max: usize },

    #[error("a poll needs at least one candidate")]
    NoCandidates,

    #[error("candidate index {index} out of range (poll has {count} candidates)")]
    InvalidIndex { index: u64, count: u64 },
}

/// Failure to move a candidate list across the contract's byte-string format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("nothing to encode")]
    Empty,

    #[error("candidate #{index} contains the separator byte")]
    SeparatorByte { index: usize },

    #[error("candidate #{index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },
}
