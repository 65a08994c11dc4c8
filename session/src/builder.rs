//! Draft of a poll that has not been created yet.

use tracing::warn;

use votebox_contract::ContractBackend;
use votebox_types::{Candidate, UserId, ValidationError, MAX_CANDIDATES};

use crate::manager::SessionManager;
use crate::session::Session;

/// Accumulates up to [`MAX_CANDIDATES`] candidates for one owner.
///
/// Consumed by [`VotingBuilder::get_voting`]; clone it first to keep the draft.
pub struct VotingBuilder<B> {
    owner: UserId,
    manager: SessionManager<B>,
    candidates: Vec<Candidate>,
}

impl<B> Clone for VotingBuilder<B> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            manager: self.manager.clone(),
            candidates: self.candidates.clone(),
        }
    }
}

impl<B: ContractBackend> VotingBuilder<B> {
    pub fn new(owner: UserId, manager: SessionManager<B>) -> Self {
        Self {
            owner,
            manager,
            candidates: Vec::with_capacity(MAX_CANDIDATES),
        }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.candidates.len() >= MAX_CANDIDATES
    }

    /// Append a candidate.
    ///
    /// `Ok(false)` once the draft is full; the draft is not changed. Invalid or
    /// repeated names are rejected with a [`ValidationError`].
    pub fn add_candidate(&mut self, name: &str) -> Result<bool, ValidationError> {
        if self.is_full() {
            return Ok(false);
        }
        let candidate = Candidate::new(name)?;
        if self.candidates.contains(&candidate) {
            return Err(ValidationError::DuplicateCandidate(name.to_string()));
        }
        self.candidates.push(candidate);
        Ok(true)
    }

    /// Create the poll. An empty draft yields `None` without any remote call.
    pub async fn get_voting(self) -> Option<Session<B>> {
        if self.candidates.is_empty() {
            return None;
        }
        let owner = self.owner;
        let names = self.candidates.into_iter().map(String::from);
        match self.manager.create_session(names, owner).await {
            Ok(session) => Some(session),
            Err(error) => {
                warn!(%owner, %error, "could not create voting session");
                None
            }
        }
    }
}
