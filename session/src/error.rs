use thiserror::Error;

use votebox_contract::ClientError;
use votebox_types::{EncodingError, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid poll: {0}")]
    Validation(#[from] ValidationError),

    #[error("cannot encode candidates: {0}")]
    Encoding(#[from] EncodingError),

    #[error("voting contract could not be deployed")]
    Creation,
}

/// Why a session query has no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The contract was destroyed. Retrying will not help.
    #[error("the poll has been closed")]
    Closed,

    /// The remote environment could not be reached or gave no usable answer.
    #[error("the poll could not be reached")]
    Unavailable,
}

impl From<&ClientError> for QueryError {
    fn from(error: &ClientError) -> Self {
        if error.is_destroyed() {
            QueryError::Closed
        } else {
            QueryError::Unavailable
        }
    }
}

/// Why [`SessionManager::lookup_session`](crate::SessionManager::lookup_session)
/// could not bind to an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Not a poll this manager may attach to.
    #[error("no poll at this address")]
    Unknown,

    /// The poll existed and has been finalized.
    #[error("the poll has been closed")]
    Closed,

    #[error("the poll could not be reached")]
    Unavailable,
}
