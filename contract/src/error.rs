use thiserror::Error;

use votebox_types::{Address, TxHash, ValidationError};

/// Anything that went wrong on the far side of the RPC boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteCallError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("node returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("transaction {tx} reverted")]
    Reverted { tx: TxHash },

    #[error("transaction {tx} was mined but left no trace in the contract")]
    NoEffect { tx: TxHash },

    #[error("transaction {tx} not confirmed in time")]
    ConfirmationTimeout { tx: TxHash },

    #[error("deployment {tx} confirmed without a contract address")]
    MissingContractAddress { tx: TxHash },

    #[error("no contract code at {address}")]
    NoCode { address: Address },

    #[error("node exposes no account to send from")]
    NoSender,
}

/// Error returned by [`ContractClient`](crate::ContractClient) operations.
///
/// `Validation` is raised before any remote call. `Remote` has already been
/// logged by the client when it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteCallError),
}

impl ClientError {
    pub fn is_remote(&self) -> bool {
        matches!(self, ClientError::Remote(_))
    }

    /// The contract is gone: its address no longer holds code.
    pub fn is_destroyed(&self) -> bool {
        matches!(self, ClientError::Remote(RemoteCallError::NoCode { .. }))
    }
}
