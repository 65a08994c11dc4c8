//! Client library for the voting contract.
//!
//! Provides:
//! - ABI bindings and creation bytecode for the contract
//! - The [`ContractBackend`] seam over the node's RPC surface
//! - [`JsonRpcBackend`], a `reqwest` implementation of that seam
//! - [`ContractClient`], typed and bound-checked access to one contract

pub mod abi;
pub mod backend;
pub mod client;
pub mod error;
pub mod json_rpc;

pub use backend::{await_confirmation, ConfirmationPolicy, ContractBackend, Receipt};
pub use client::ContractClient;
pub use error::{ClientError, RemoteCallError};
pub use json_rpc::{JsonRpcBackend, RpcSettings};
