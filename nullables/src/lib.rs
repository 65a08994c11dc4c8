//! Nullable infrastructure for deterministic testing.
//!
//! The remote environment is abstracted behind
//! [`ContractBackend`](votebox_contract::ContractBackend). This crate provides a
//! test-friendly implementation that:
//! - Executes the voting contract's rules in memory
//! - Can be controlled programmatically (delayed receipts, injected failures)
//! - Never touches the network
//!
//! Usage: swap `JsonRpcBackend` for [`NullChain`] in tests.

pub mod chain;

pub use chain::{Method, NullChain};
