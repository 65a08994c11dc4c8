//! The remote environment as seen by the client.
//!
//! A backend is anything that can answer the four node requests the voting
//! client needs. [`JsonRpcBackend`](crate::JsonRpcBackend) talks to a real node;
//! `votebox-nullables` provides an in-memory chain for tests.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;
use votebox_types::{Address, Bytes, TxHash};

use crate::error::RemoteCallError;

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub success: bool,
    /// Set for contract deployments.
    pub contract_address: Option<Address>,
}

pub trait ContractBackend: Send + Sync + 'static {
    /// Execute a read-only call against `to` and return the raw return data.
    fn call(
        &self,
        to: Address,
        data: Bytes,
    ) -> impl Future<Output = Result<Bytes, RemoteCallError>> + Send;

    /// Submit a state-changing transaction. `to == None` deploys `data` as code.
    fn send_transaction(
        &self,
        to: Option<Address>,
        data: Bytes,
    ) -> impl Future<Output = Result<TxHash, RemoteCallError>> + Send;

    /// Receipt for `tx`, or `None` while it is still pending.
    fn transaction_receipt(
        &self,
        tx: TxHash,
    ) -> impl Future<Output = Result<Option<Receipt>, RemoteCallError>> + Send;

    /// Deployed code at `address`; empty for plain accounts and destroyed contracts.
    fn code_at(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<Bytes, RemoteCallError>> + Send;
}

/// How long to wait for a transaction to be mined, and how often to look.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Block until `tx` has a successful receipt.
///
/// A reverted transaction is an error. So is a timeout; the transaction may
/// still be mined later, and that late effect is not reported to anyone.
pub async fn await_confirmation<B: ContractBackend>(
    backend: &B,
    tx: TxHash,
    policy: ConfirmationPolicy,
) -> Result<Receipt, RemoteCallError> {
    let started = Instant::now();
    loop {
        if let Some(receipt) = backend.transaction_receipt(tx).await? {
            if !receipt.success {
                return Err(RemoteCallError::Reverted { tx });
            }
            debug!(%tx, elapsed_ms = started.elapsed().as_millis() as u64, "transaction confirmed");
            return Ok(receipt);
        }
        if started.elapsed() >= policy.timeout {
            return Err(RemoteCallError::ConfirmationTimeout { tx });
        }
        tokio::time::sleep(policy.poll_interval).await;
    }
}
