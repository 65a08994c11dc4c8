//! Typed access to one deployed voting contract.

use std::sync::Arc;

use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use tracing::{debug, info, warn};

use votebox_types::codec::SEPARATOR;
use votebox_types::{Address, Bytes, UserId, ValidationError};

use crate::abi::{deployment_data, Voting};
use crate::backend::{await_confirmation, ConfirmationPolicy, ContractBackend, Receipt};
use crate::error::{ClientError, RemoteCallError};

/// Client bound to exactly one contract address.
///
/// Holds no mirrored contract state apart from the candidate count, which the
/// contract never changes after construction. Every other read goes to the
/// backend. Remote failures are logged here, once, and returned as
/// [`ClientError::Remote`].
pub struct ContractClient<B> {
    backend: Arc<B>,
    address: Address,
    candidate_count: u64,
    confirmation: ConfirmationPolicy,
}

impl<B> Clone for ContractClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            address: self.address,
            candidate_count: self.candidate_count,
            confirmation: self.confirmation,
        }
    }
}

impl<B: ContractBackend> ContractClient<B> {
    /// Deploy a new contract and wait until it is mined.
    ///
    /// `candidates` is the codec blob; the contract splits it on the separator
    /// byte. The count the contract reports after deployment must match.
    pub async fn create(
        backend: Arc<B>,
        confirmation: ConfirmationPolicy,
        candidates: Bytes,
        owner: UserId,
    ) -> Option<Self> {
        let expected = candidates.iter().filter(|b| **b == SEPARATOR).count() as u64 + 1;
        let result = async {
            let address = deploy(&*backend, confirmation, candidates, owner).await?;
            let reported = read_count(&*backend, address).await?;
            if reported != expected {
                return Err(RemoteCallError::MalformedResponse(format!(
                    "contract {address} reports {reported} candidates, {expected} were deployed"
                )));
            }
            Ok(address)
        }
        .await;
        match result {
            Ok(address) => {
                info!(%address, %owner, candidate_count = expected, "voting contract deployed");
                Some(Self {
                    backend,
                    address,
                    candidate_count: expected,
                    confirmation,
                })
            }
            Err(error) => {
                warn!(op = "create", %owner, %error, "remote call failed");
                None
            }
        }
    }

    /// Bind to an existing contract. Returns `None` if nothing lives at `address`.
    pub async fn restore(
        backend: Arc<B>,
        confirmation: ConfirmationPolicy,
        address: Address,
    ) -> Option<Self> {
        Self::bind(backend, confirmation, address).await.ok()
    }

    /// Like [`ContractClient::restore`], but says why binding failed.
    ///
    /// [`RemoteCallError::NoCode`] means the address never held a contract or
    /// the contract was destroyed.
    pub async fn bind(
        backend: Arc<B>,
        confirmation: ConfirmationPolicy,
        address: Address,
    ) -> Result<Self, RemoteCallError> {
        match live_count(&*backend, address).await {
            Ok(candidate_count) => Ok(Self {
                backend,
                address,
                candidate_count,
                confirmation,
            }),
            Err(error) => {
                match &error {
                    RemoteCallError::NoCode { .. } => warn!(%address, "no contract code at address"),
                    _ => warn!(op = "restore", %address, %error, "remote call failed"),
                }
                Err(error)
            }
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Candidate count learned when the client was bound. Used for bound checks.
    pub fn known_candidate_count(&self) -> u64 {
        self.candidate_count
    }

    /// Number of candidates, read from the contract.
    pub async fn candidate_count(&self) -> Result<u64, ClientError> {
        let result = read_count(&*self.backend, self.address).await;
        self.logged("candidate_count", result)
    }

    pub async fn get_candidate(&self, index: u64) -> Result<Bytes, ClientError> {
        self.check_index(index)?;
        let result = self.read_candidate(index).await;
        self.logged("get_candidate", result)
    }

    /// All candidates in order. One failed read fails the whole list.
    pub async fn get_all_candidates(&self) -> Result<Vec<Bytes>, ClientError> {
        let result = async {
            let mut candidates = Vec::with_capacity(self.candidate_count as usize);
            for index in 0..self.candidate_count {
                candidates.push(self.read_candidate(index).await?);
            }
            Ok::<_, RemoteCallError>(candidates)
        }
        .await;
        self.logged("get_all_candidates", result)
    }

    pub async fn get_vote_count(&self, index: u64) -> Result<u64, ClientError> {
        self.check_index(index)?;
        let result = self.read_votes(index).await;
        self.logged("get_vote_count", result)
    }

    /// Every candidate paired with its vote count, all or nothing.
    pub async fn get_candidates_and_votes(&self) -> Result<Vec<(Bytes, u64)>, ClientError> {
        let result = async {
            let mut tally = Vec::with_capacity(self.candidate_count as usize);
            for index in 0..self.candidate_count {
                let candidate = self.read_candidate(index).await?;
                let votes = self.read_votes(index).await?;
                tally.push((candidate, votes));
            }
            Ok::<_, RemoteCallError>(tally)
        }
        .await;
        self.logged("get_candidates_and_votes", result)
    }

    pub async fn has_voted(&self, voter: UserId) -> Result<bool, ClientError> {
        let call = Voting::hasVotedCall {
            voterId: U256::from(voter.get()),
        };
        let result = read_call(&*self.backend, self.address, call).await;
        self.logged("has_voted", result.map(|r| r._0))
    }

    pub async fn owner(&self) -> Result<UserId, ClientError> {
        let result = async {
            let owner = read_call(&*self.backend, self.address, Voting::getOwnerCall {}).await?;
            to_u64(owner._0, "owner id").map(UserId::new)
        }
        .await;
        self.logged("owner", result)
    }

    /// Cast a vote and wait for it to be mined.
    ///
    /// Does not check `has_voted` first; the contract rejects a second vote and
    /// that rejection comes back as a revert. Once mined, the vote is read back:
    /// a transaction to a destroyed contract is mined successfully but changes
    /// nothing.
    pub async fn vote(&self, voter: UserId, candidate_index: u64) -> Result<(), ClientError> {
        self.check_index(candidate_index)?;
        let voter_id = U256::from(voter.get());
        let call = Voting::voteCall {
            voterId: voter_id,
            candidateIndex: U256::from(candidate_index),
        };
        let result = async {
            let receipt = self.transact(call.abi_encode()).await?;
            let check = Voting::hasVotedCall { voterId: voter_id };
            if read_call(&*self.backend, self.address, check).await?._0 {
                Ok(receipt)
            } else {
                Err(RemoteCallError::NoEffect {
                    tx: receipt.tx_hash,
                })
            }
        }
        .await;
        let receipt = self.logged("vote", result)?;
        debug!(address = %self.address, %voter, candidate_index, tx = %receipt.tx_hash, "vote recorded");
        Ok(())
    }

    /// Destroy the contract if `requester` is its owner.
    ///
    /// `Ok(false)` means the requester is not the owner; no transaction is sent.
    pub async fn kill(&self, requester: UserId) -> Result<bool, ClientError> {
        let owner = self.owner().await?;
        if owner != requester {
            info!(address = %self.address, %requester, "refusing to destroy contract for non-owner");
            return Ok(false);
        }
        let result = self.transact(Voting::killCall {}.abi_encode()).await;
        self.logged("kill", result)?;
        info!(address = %self.address, "voting contract destroyed");
        Ok(true)
    }

    fn check_index(&self, index: u64) -> Result<(), ValidationError> {
        if index < self.candidate_count {
            Ok(())
        } else {
            Err(ValidationError::InvalidIndex {
                index,
                count: self.candidate_count,
            })
        }
    }

    async fn read_candidate(&self, index: u64) -> Result<Bytes, RemoteCallError> {
        let call = Voting::getCandidateCall {
            index: U256::from(index),
        };
        read_call(&*self.backend, self.address, call)
            .await
            .map(|r| r._0)
    }

    async fn read_votes(&self, index: u64) -> Result<u64, RemoteCallError> {
        let call = Voting::getCandidateVotesCall {
            index: U256::from(index),
        };
        let votes = read_call(&*self.backend, self.address, call).await?;
        to_u64(votes._0, "vote count")
    }

    async fn transact(&self, data: Vec<u8>) -> Result<Receipt, RemoteCallError> {
        let tx = self
            .backend
            .send_transaction(Some(self.address), Bytes::from(data))
            .await?;
        await_confirmation(&*self.backend, tx, self.confirmation).await
    }

    fn logged<T>(
        &self,
        op: &'static str,
        result: Result<T, RemoteCallError>,
    ) -> Result<T, ClientError> {
        result.map_err(|error| {
            warn!(op, address = %self.address, %error, "remote call failed");
            ClientError::Remote(error)
        })
    }
}

async fn deploy<B: ContractBackend>(
    backend: &B,
    confirmation: ConfirmationPolicy,
    candidates: Bytes,
    owner: UserId,
) -> Result<Address, RemoteCallError> {
    let tx = backend
        .send_transaction(None, deployment_data(candidates, owner))
        .await?;
    let receipt = await_confirmation(backend, tx, confirmation).await?;
    receipt
        .contract_address
        .ok_or(RemoteCallError::MissingContractAddress { tx })
}

async fn live_count<B: ContractBackend>(backend: &B, address: Address) -> Result<u64, RemoteCallError> {
    let code = backend.code_at(address).await?;
    if code.is_empty() {
        return Err(RemoteCallError::NoCode { address });
    }
    read_count(backend, address).await
}

async fn read_count<B: ContractBackend>(backend: &B, address: Address) -> Result<u64, RemoteCallError> {
    let count = read_call(backend, address, Voting::getNumberOfCandidatesCall {}).await?;
    to_u64(count._0, "candidate count")
}

async fn read_call<B, C>(backend: &B, to: Address, call: C) -> Result<C::Return, RemoteCallError>
where
    B: ContractBackend,
    C: SolCall + Send,
{
    let raw = backend.call(to, Bytes::from(call.abi_encode())).await?;
    // Every getter returns data; an empty reply means there is no code to run.
    if raw.is_empty() && backend.code_at(to).await?.is_empty() {
        return Err(RemoteCallError::NoCode { address: to });
    }
    C::abi_decode_returns(&raw, true)
        .map_err(|e| RemoteCallError::MalformedResponse(format!("{}: {e}", C::SIGNATURE)))
}

fn to_u64(value: U256, what: &str) -> Result<u64, RemoteCallError> {
    u64::try_from(value).map_err(|_| {
        RemoteCallError::MalformedResponse(format!("{what} {value} does not fit in 64 bits"))
    })
}
