//! Ethereum JSON-RPC backend over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use votebox_types::{Address, Bytes, TxHash};

use crate::backend::{ContractBackend, Receipt};
use crate::error::RemoteCallError;

/// Connection settings for [`JsonRpcBackend`].
#[derive(Clone, Debug)]
pub struct RpcSettings {
    /// Node endpoint, e.g. `http://127.0.0.1:7545`.
    pub url: String,
    /// Account transactions and calls are sent from. `None` picks the node's
    /// first unlocked account.
    pub sender: Option<Address>,
    /// Gas attached to every transaction. `None` lets the node estimate.
    pub gas_limit: Option<u64>,
    pub request_timeout: Duration,
}

impl RpcSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sender: None,
            gas_limit: Some(3_000_000),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client speaking JSON-RPC 2.0 to an Ethereum node.
///
/// Wraps `reqwest::Client` with the node URL and the sending account.
pub struct JsonRpcBackend {
    http: reqwest::Client,
    url: String,
    sender: Address,
    gas_limit: Option<u64>,
    next_id: AtomicU64,
}

impl JsonRpcBackend {
    /// Build the client and resolve the sending account.
    pub async fn connect(settings: RpcSettings) -> Result<Self, RemoteCallError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RemoteCallError::Transport(format!("failed to create HTTP client: {e}")))?;
        let mut backend = Self {
            http,
            url: settings.url,
            sender: Address::ZERO,
            gas_limit: settings.gas_limit,
            next_id: AtomicU64::new(1),
        };
        backend.sender = match settings.sender {
            Some(sender) => sender,
            None => backend.first_account().await?,
        };
        debug!(url = %backend.url, sender = %backend.sender, "connected to node");
        Ok(backend)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    async fn first_account(&self) -> Result<Address, RemoteCallError> {
        let result = self.rpc_call("eth_accounts", json!([])).await?;
        let accounts: Vec<Address> = serde_json::from_value(result)
            .map_err(|e| RemoteCallError::MalformedResponse(format!("eth_accounts: {e}")))?;
        accounts.first().copied().ok_or(RemoteCallError::NoSender)
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, RemoteCallError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteCallError::Transport(format!("{method}: request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RemoteCallError::Transport(format!(
                "{method}: node returned HTTP {}",
                response.status()
            )));
        }

        let reply: RpcReply = response
            .json()
            .await
            .map_err(|e| RemoteCallError::MalformedResponse(format!("{method}: {e}")))?;
        debug!(method, id, "rpc round-trip");
        reply.into_result()
    }

    fn transaction_object(&self, to: Option<Address>, data: &Bytes) -> Value {
        let mut tx = json!({
            "from": self.sender,
            "data": encode_hex(data),
        });
        if let Some(to) = to {
            tx["to"] = json!(to);
        }
        if let Some(gas) = self.gas_limit {
            tx["gas"] = json!(format!("{gas:#x}"));
        }
        tx
    }
}

impl ContractBackend for JsonRpcBackend {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RemoteCallError> {
        let tx = json!({
            "from": self.sender,
            "to": to,
            "data": encode_hex(&data),
        });
        let result = self.rpc_call("eth_call", json!([tx, "latest"])).await?;
        decode_hex_value("eth_call", &result)
    }

    async fn send_transaction(
        &self,
        to: Option<Address>,
        data: Bytes,
    ) -> Result<TxHash, RemoteCallError> {
        let tx = self.transaction_object(to, &data);
        let result = self.rpc_call("eth_sendTransaction", json!([tx])).await?;
        serde_json::from_value(result)
            .map_err(|e| RemoteCallError::MalformedResponse(format!("eth_sendTransaction: {e}")))
    }

    async fn transaction_receipt(&self, tx: TxHash) -> Result<Option<Receipt>, RemoteCallError> {
        let result = self
            .rpc_call("eth_getTransactionReceipt", json!([tx]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let raw: RawReceipt = serde_json::from_value(result).map_err(|e| {
            RemoteCallError::MalformedResponse(format!("eth_getTransactionReceipt: {e}"))
        })?;
        raw.into_receipt().map(Some)
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, RemoteCallError> {
        let result = self
            .rpc_call("eth_getCode", json!([address, "latest"]))
            .await?;
        decode_hex_value("eth_getCode", &result)
    }
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcReply {
    fn into_result(self) -> Result<Value, RemoteCallError> {
        if let Some(err) = self.error {
            return Err(RemoteCallError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: TxHash,
    /// Absent on pre-Byzantium nodes, which only mine successful transactions.
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    contract_address: Option<Address>,
}

impl RawReceipt {
    fn into_receipt(self) -> Result<Receipt, RemoteCallError> {
        let success = match self.status.as_deref() {
            None => true,
            Some(status) => parse_quantity(status)? == 1,
        };
        Ok(Receipt {
            tx_hash: self.transaction_hash,
            success,
            contract_address: self.contract_address,
        })
    }
}

fn encode_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn decode_hex(s: &str) -> Result<Bytes, RemoteCallError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| RemoteCallError::MalformedResponse(format!("bad hex {s:?}: {e}")))
}

fn decode_hex_value(method: &str, value: &Value) -> Result<Bytes, RemoteCallError> {
    let s = value.as_str().ok_or_else(|| {
        RemoteCallError::MalformedResponse(format!("{method}: expected hex string, got {value}"))
    })?;
    decode_hex(s)
}

fn parse_quantity(s: &str) -> Result<u64, RemoteCallError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .map_err(|e| RemoteCallError::MalformedResponse(format!("bad quantity {s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_helpers_handle_prefix_and_empty() {
        assert_eq!(encode_hex(&[0xde, 0xad]), "0xdead");
        assert_eq!(decode_hex("0x").unwrap().len(), 0);
        assert_eq!(decode_hex("0xbeef").unwrap().as_ref(), &[0xbe, 0xef]);
        assert!(decode_hex("0xzz").is_err());
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_quantity("0x1").unwrap(), 1);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert!(parse_quantity("0xg").is_err());
    }

    #[test]
    fn error_reply_becomes_rpc_error() {
        let reply: RpcReply = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "VM Exception while processing transaction: revert" }
        }))
        .unwrap();
        match reply.into_result() {
            Err(RemoteCallError::Rpc { code, message }) => {
                assert_eq!(code, -32000);
                assert!(message.contains("revert"));
            }
            other => panic!("expected rpc error, got {other:?}"),
        }
    }

    #[test]
    fn receipt_status_zero_is_failure() {
        let raw: RawReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "status": "0x0",
            "contractAddress": null
        }))
        .unwrap();
        let receipt = raw.into_receipt().unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.contract_address, None);
    }

    #[test]
    fn deployment_receipt_carries_address() {
        let raw: RawReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "22".repeat(32)),
            "status": "0x1",
            "contractAddress": "0x00000000000000000000000000000000000000aa"
        }))
        .unwrap();
        let receipt = raw.into_receipt().unwrap();
        assert!(receipt.success);
        assert_eq!(
            receipt.contract_address,
            Some(Address::with_last_byte(0xaa))
        );
    }

    #[test]
    fn receipt_without_status_counts_as_success() {
        let raw: RawReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "33".repeat(32)),
        }))
        .unwrap();
        assert!(raw.into_receipt().unwrap().success);
    }
}
