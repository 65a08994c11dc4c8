//! In-memory node hosting voting contracts.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use alloy_primitives::U256;
use alloy_sol_types::{sol_data, SolCall, SolInterface, SolType};

use votebox_contract::abi::{voting_bytecode, Voting};
use votebox_contract::{ContractBackend, Receipt, RemoteCallError};
use votebox_types::{Address, Bytes, TxHash, UserId};

/// Node requests, for counting what a client actually sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Call,
    SendTransaction,
    TransactionReceipt,
    CodeAt,
}

/// A single-account chain that executes the voting contract's rules in memory.
///
/// Mirrors what a node does at the RPC boundary: calls to an address without
/// code return empty data, reverted transactions are mined with a failed
/// receipt, and `kill` removes the contract's code. Thread-safe for use with
/// tokio's multi-threaded runtime.
pub struct NullChain {
    state: Mutex<ChainState>,
    requests: Mutex<HashMap<Method, usize>>,
    fail_next: AtomicUsize,
    fail_sends: AtomicUsize,
}

#[derive(Default)]
struct ChainState {
    contracts: HashMap<Address, ContractState>,
    doomed: Option<Address>,
    receipts: HashMap<TxHash, PendingReceipt>,
    receipt_delay: u32,
    next_contract: u64,
    next_tx: u64,
}

struct ContractState {
    candidates: Vec<Bytes>,
    votes: Vec<u64>,
    voted: HashSet<U256>,
    owner: U256,
}

struct PendingReceipt {
    receipt: Receipt,
    polls_left: u32,
}

type ConstructorArgs = (sol_data::Bytes, sol_data::Uint<256>);

impl NullChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState::default()),
            requests: Mutex::new(HashMap::new()),
            fail_next: AtomicUsize::new(0),
            fail_sends: AtomicUsize::new(0),
        }
    }

    /// Make the next `n` requests of any kind fail with a transport error.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` `send_transaction` requests fail with a transport error.
    pub fn fail_next_sends(&self, n: usize) {
        self.fail_sends.store(n, Ordering::SeqCst);
    }

    /// Number of receipt polls that return "pending" before a receipt shows up.
    pub fn set_receipt_delay(&self, polls: u32) {
        self.state.lock().unwrap().receipt_delay = polls;
    }

    /// Destroy the contract at `address` just before the next transaction is
    /// applied, as if another holder's `kill` was mined first.
    pub fn destroy_before_next_send(&self, address: Address) {
        self.state.lock().unwrap().doomed = Some(address);
    }

    /// Requests of one kind received so far.
    pub fn request_count(&self, method: Method) -> usize {
        self.requests
            .lock()
            .unwrap()
            .get(&method)
            .copied()
            .unwrap_or(0)
    }

    /// Requests of every kind received so far.
    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().values().sum()
    }

    /// Whether `address` currently hosts a contract.
    pub fn is_alive(&self, address: Address) -> bool {
        self.state.lock().unwrap().contracts.contains_key(&address)
    }

    /// Vote counts of a live contract.
    pub fn votes(&self, address: Address) -> Option<Vec<u64>> {
        self.state
            .lock()
            .unwrap()
            .contracts
            .get(&address)
            .map(|c| c.votes.clone())
    }

    /// Deploy a contract without going through any client.
    pub fn deploy_directly(&self, candidates: &[&str], owner: UserId) -> Address {
        let blob = candidates.join("\0").into_bytes();
        let mut state = self.state.lock().unwrap();
        state.create_contract(&blob, U256::from(owner.get()))
    }

    /// An address that has never held code.
    pub fn plain_account(&self) -> Address {
        Address::with_last_byte(0x77)
    }

    fn begin(&self, method: Method) -> Result<MutexGuard<'_, ChainState>, RemoteCallError> {
        *self.requests.lock().unwrap().entry(method).or_default() += 1;
        if take_one(&self.fail_next) {
            return Err(RemoteCallError::Transport(format!("{method:?}: injected failure")));
        }
        if method == Method::SendTransaction && take_one(&self.fail_sends) {
            return Err(RemoteCallError::Transport("send: injected failure".into()));
        }
        Ok(self.state.lock().unwrap())
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractBackend for NullChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RemoteCallError> {
        let state = self.begin(Method::Call)?;
        match state.contracts.get(&to) {
            Some(contract) => contract.view(&data),
            None => Ok(Bytes::new()),
        }
    }

    async fn send_transaction(
        &self,
        to: Option<Address>,
        data: Bytes,
    ) -> Result<TxHash, RemoteCallError> {
        let mut state = self.begin(Method::SendTransaction)?;
        if let Some(doomed) = state.doomed.take() {
            state.contracts.remove(&doomed);
        }
        let (success, contract_address) = match to {
            None => match decode_deployment(&data) {
                Some((blob, owner)) => (true, Some(state.create_contract(&blob, owner))),
                None => (false, None),
            },
            Some(address) => (state.execute(address, &data), None),
        };
        Ok(state.mine(success, contract_address))
    }

    async fn transaction_receipt(&self, tx: TxHash) -> Result<Option<Receipt>, RemoteCallError> {
        let mut state = self.begin(Method::TransactionReceipt)?;
        match state.receipts.get_mut(&tx) {
            Some(pending) if pending.polls_left > 0 => {
                pending.polls_left -= 1;
                Ok(None)
            }
            Some(pending) => Ok(Some(pending.receipt.clone())),
            None => Ok(None),
        }
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, RemoteCallError> {
        let state = self.begin(Method::CodeAt)?;
        if state.contracts.contains_key(&address) {
            Ok(Bytes::from_static(&[0x60, 0x80]))
        } else {
            Ok(Bytes::new())
        }
    }
}

impl ChainState {
    fn create_contract(&mut self, blob: &[u8], owner: U256) -> Address {
        self.next_contract += 1;
        let mut raw = [0u8; 20];
        raw[0] = 0xc0;
        raw[12..].copy_from_slice(&self.next_contract.to_be_bytes());
        let address = Address::from(raw);
        let candidates: Vec<Bytes> = blob
            .split(|b| *b == 0)
            .map(|c| Bytes::copy_from_slice(c))
            .collect();
        let votes = vec![0; candidates.len()];
        self.contracts.insert(
            address,
            ContractState {
                candidates,
                votes,
                voted: HashSet::new(),
                owner,
            },
        );
        address
    }

    /// Apply a transaction to `to`. Returns `false` when the contract reverts.
    fn execute(&mut self, to: Address, data: &[u8]) -> bool {
        let Some(contract) = self.contracts.get_mut(&to) else {
            // plain value transfer to an account without code
            return true;
        };
        match Voting::VotingCalls::abi_decode(data, true) {
            Ok(Voting::VotingCalls::vote(call)) => {
                let Some(index) = contract.index(call.candidateIndex) else {
                    return false;
                };
                if !contract.voted.insert(call.voterId) {
                    return false;
                }
                contract.votes[index] += 1;
                true
            }
            Ok(Voting::VotingCalls::kill(_)) => {
                self.contracts.remove(&to);
                true
            }
            Ok(_) => true,
            Err(_) => false,
        }
    }

    fn mine(&mut self, success: bool, contract_address: Option<Address>) -> TxHash {
        self.next_tx += 1;
        let mut raw = [0u8; 32];
        raw[24..].copy_from_slice(&self.next_tx.to_be_bytes());
        let tx_hash = TxHash::from(raw);
        self.receipts.insert(
            tx_hash,
            PendingReceipt {
                receipt: Receipt {
                    tx_hash,
                    success,
                    contract_address,
                },
                polls_left: self.receipt_delay,
            },
        );
        tx_hash
    }
}

impl ContractState {
    fn index(&self, raw: U256) -> Option<usize> {
        usize::try_from(raw)
            .ok()
            .filter(|i| *i < self.candidates.len())
    }

    fn view(&self, data: &[u8]) -> Result<Bytes, RemoteCallError> {
        let call = Voting::VotingCalls::abi_decode(data, true).map_err(|_| revert())?;
        let out = match call {
            Voting::VotingCalls::getCandidate(c) => {
                let index = self.index(c.index).ok_or_else(revert)?;
                Voting::getCandidateCall::abi_encode_returns(&(self.candidates[index].clone(),))
            }
            Voting::VotingCalls::getNumberOfCandidates(_) => {
                Voting::getNumberOfCandidatesCall::abi_encode_returns(&(U256::from(
                    self.candidates.len(),
                ),))
            }
            Voting::VotingCalls::getCandidateVotes(c) => {
                let index = self.index(c.index).ok_or_else(revert)?;
                Voting::getCandidateVotesCall::abi_encode_returns(&(U256::from(
                    self.votes[index],
                ),))
            }
            Voting::VotingCalls::hasVoted(c) => {
                Voting::hasVotedCall::abi_encode_returns(&(self.voted.contains(&c.voterId),))
            }
            Voting::VotingCalls::getOwner(_) => {
                Voting::getOwnerCall::abi_encode_returns(&(self.owner,))
            }
            Voting::VotingCalls::vote(_) | Voting::VotingCalls::kill(_) => Vec::new(),
        };
        Ok(Bytes::from(out))
    }
}

fn decode_deployment(data: &[u8]) -> Option<(Vec<u8>, U256)> {
    let args = data.strip_prefix(voting_bytecode())?;
    let (blob, owner) = ConstructorArgs::abi_decode_params(args, true).ok()?;
    Some((blob.to_vec(), owner))
}

fn revert() -> RemoteCallError {
    RemoteCallError::Rpc {
        code: -32000,
        message: "VM Exception while processing transaction: revert".into(),
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deployment_splits_candidates() {
        let chain = NullChain::new();
        let address = chain.deploy_directly(&["A", "B", "C"], UserId::new(1));
        assert!(chain.is_alive(address));
        assert_eq!(chain.votes(address), Some(vec![0, 0, 0]));
    }

    #[tokio::test]
    async fn calls_to_empty_address_return_nothing() {
        let chain = NullChain::new();
        let out = chain
            .call(chain.plain_account(), Bytes::from_static(&[1, 2, 3, 4]))
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn second_vote_reverts() {
        let chain = NullChain::new();
        let address = chain.deploy_directly(&["A", "B"], UserId::new(1));
        let vote = Voting::voteCall {
            voterId: U256::from(9),
            candidateIndex: U256::from(1),
        }
        .abi_encode();
        let first = chain
            .send_transaction(Some(address), Bytes::from(vote.clone()))
            .await
            .unwrap();
        let second = chain
            .send_transaction(Some(address), Bytes::from(vote))
            .await
            .unwrap();
        let first = chain.transaction_receipt(first).await.unwrap().unwrap();
        let second = chain.transaction_receipt(second).await.unwrap().unwrap();
        assert!(first.success);
        assert!(!second.success);
        assert_eq!(chain.votes(address), Some(vec![0, 1]));
    }

    #[tokio::test]
    async fn receipts_can_be_delayed() {
        let chain = NullChain::new();
        chain.set_receipt_delay(2);
        let address = chain.deploy_directly(&["A"], UserId::new(1));
        let tx = chain
            .send_transaction(Some(address), Bytes::from(Voting::killCall {}.abi_encode()))
            .await
            .unwrap();
        assert!(chain.transaction_receipt(tx).await.unwrap().is_none());
        assert!(chain.transaction_receipt(tx).await.unwrap().is_none());
        assert!(chain.transaction_receipt(tx).await.unwrap().is_some());
        assert!(!chain.is_alive(address));
    }

    #[tokio::test]
    async fn vote_racing_a_kill_is_mined_without_effect() {
        let chain = NullChain::new();
        let address = chain.deploy_directly(&["A"], UserId::new(1));
        chain.destroy_before_next_send(address);
        let vote = Voting::voteCall {
            voterId: U256::from(3),
            candidateIndex: U256::from(0),
        }
        .abi_encode();
        let tx = chain
            .send_transaction(Some(address), Bytes::from(vote))
            .await
            .unwrap();
        assert!(chain.transaction_receipt(tx).await.unwrap().unwrap().success);
        assert!(!chain.is_alive(address));
        assert_eq!(chain.votes(address), None);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let chain = NullChain::new();
        chain.fail_next(1);
        assert!(chain.code_at(chain.plain_account()).await.is_err());
        assert!(chain.code_at(chain.plain_account()).await.is_ok());
        assert_eq!(chain.request_count(Method::CodeAt), 2);
    }
}
