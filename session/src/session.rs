//! One live poll bound to one contract address.

use std::fmt;

use tracing::warn;

use votebox_contract::{ClientError, ContractBackend, ContractClient, RemoteCallError};
use votebox_types::codec::decode_candidate;
use votebox_types::{Address, Bytes, EncodingError, TallyEntry, UserId, ValidationError};

use crate::error::QueryError;
use crate::manager::SessionManager;
use crate::outcome::{FinalizeOutcome, VoteOutcome};

/// Handle to a voting session.
///
/// Nothing is cached: every query goes to the contract. A
/// [`QueryError::Unavailable`] may be retried; [`QueryError::Closed`] is final.
pub struct Session<B> {
    manager: SessionManager<B>,
    client: ContractClient<B>,
}

impl<B> Clone for Session<B> {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            client: self.client.clone(),
        }
    }
}

impl<B: ContractBackend> fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.client.address())
            .field("candidates", &self.client.known_candidate_count())
            .finish()
    }
}

impl<B: ContractBackend> Session<B> {
    pub(crate) fn new(manager: SessionManager<B>, client: ContractClient<B>) -> Self {
        Self { manager, client }
    }

    pub fn address(&self) -> Address {
        self.client.address()
    }

    pub fn candidate_count(&self) -> u64 {
        self.client.known_candidate_count()
    }

    pub(crate) fn client(&self) -> &ContractClient<B> {
        &self.client
    }

    pub async fn get_candidates(&self) -> Result<Vec<String>, QueryError> {
        let raw = self
            .client
            .get_all_candidates()
            .await
            .map_err(|e| QueryError::from(&e))?;
        raw.iter()
            .map(|c| decode_candidate(c))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| {
                warn!(address = %self.address(), %error, "undecodable candidate");
                QueryError::Unavailable
            })
    }

    pub async fn has_voted(&self, voter: UserId) -> Result<bool, QueryError> {
        self.client
            .has_voted(voter)
            .await
            .map_err(|e| QueryError::from(&e))
    }

    /// Cast a vote for `candidate_index` and return the updated tally.
    ///
    /// Checks `has_voted` first so a repeat voter gets a definite answer
    /// without a transaction being spent. The contract still enforces one
    /// vote per voter if two votes race.
    pub async fn vote_and_get_results(
        &self,
        voter: UserId,
        candidate_index: u64,
    ) -> Result<VoteOutcome, ValidationError> {
        let count = self.candidate_count();
        if candidate_index >= count {
            return Err(ValidationError::InvalidIndex {
                index: candidate_index,
                count,
            });
        }
        match self.has_voted(voter).await {
            Ok(true) => return Ok(VoteOutcome::AlreadyVoted),
            Ok(false) => {}
            Err(QueryError::Closed) => return Ok(VoteOutcome::Closed),
            Err(QueryError::Unavailable) => return Ok(VoteOutcome::Unavailable),
        }
        match self.client.vote(voter, candidate_index).await {
            Ok(()) => {}
            Err(ClientError::Validation(e)) => return Err(e),
            Err(ClientError::Remote(RemoteCallError::NoCode { .. })) => {
                return Ok(VoteOutcome::Closed)
            }
            Err(ClientError::Remote(
                RemoteCallError::Reverted { .. } | RemoteCallError::NoEffect { .. },
            )) => return Ok(VoteOutcome::Rejected),
            Err(ClientError::Remote(_)) => return Ok(VoteOutcome::Unavailable),
        }
        Ok(match self.get_candidates_votes().await {
            Ok(tally) => VoteOutcome::Counted(tally),
            Err(_) => VoteOutcome::Recorded,
        })
    }

    pub async fn get_candidates_votes(&self) -> Result<Vec<TallyEntry>, QueryError> {
        let raw = self
            .client
            .get_candidates_and_votes()
            .await
            .map_err(|e| QueryError::from(&e))?;
        decode_tally(raw).map_err(|error| {
            warn!(address = %self.address(), %error, "undecodable candidate");
            QueryError::Unavailable
        })
    }

    /// Finalize through the owning manager.
    pub async fn finalize(&self, requester: UserId) -> FinalizeOutcome {
        self.manager
            .finalize_session(self.address(), requester)
            .await
    }
}

pub(crate) fn decode_tally(raw: Vec<(Bytes, u64)>) -> Result<Vec<TallyEntry>, EncodingError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, (candidate, votes))| {
            decode_candidate(&candidate)
                .map(|name| TallyEntry::new(name, votes))
                .map_err(|_| EncodingError::InvalidUtf8 { index })
        })
        .collect()
}
