//! Bot configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use votebox_contract::{ConfirmationPolicy, RpcSettings};
use votebox_session::RestorePolicy;
use votebox_types::Address;

use crate::BotError;

/// Configuration for the votebox bot.
///
/// Can be loaded from a TOML file via [`BotConfig::from_toml_file`] or
/// built programmatically.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotConfig {
    /// JSON-RPC endpoint of the Ethereum node.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Account that sends transactions and reads. Defaults to the node's
    /// first account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Address>,

    /// Gas limit attached to every transaction.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How often to poll for a transaction receipt.
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// Give up waiting for a receipt after this long.
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,

    /// Port of the webhook server.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Conversation state is dropped after this much inactivity.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Which addresses `/open` may attach to.
    #[serde(default)]
    pub restore_policy: RestorePolicy,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_url() -> String {
    "http://127.0.0.1:7545".to_string()
}

fn default_gas_limit() -> u64 {
    3_000_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_receipt_poll_interval_ms() -> u64 {
    500
}

fn default_receipt_timeout_secs() -> u64 {
    120
}

fn default_listen_port() -> u16 {
    8080
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl BotConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, BotError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| BotError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, BotError> {
        toml::from_str(s).map_err(|e| BotError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("BotConfig is always serializable to TOML")
    }

    pub fn rpc_settings(&self) -> RpcSettings {
        RpcSettings {
            url: self.rpc_url.clone(),
            sender: self.sender,
            gas_limit: Some(self.gas_limit),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
            timeout: Duration::from_secs(self.receipt_timeout_secs),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            sender: None,
            gas_limit: default_gas_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            receipt_timeout_secs: default_receipt_timeout_secs(),
            listen_port: default_listen_port(),
            idle_timeout_secs: default_idle_timeout_secs(),
            restore_policy: RestorePolicy::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = BotConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = BotConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.rpc_url, config.rpc_url);
        assert_eq!(parsed.listen_port, config.listen_port);
        assert_eq!(parsed.sender, None);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = BotConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_url, "http://127.0.0.1:7545");
        assert_eq!(config.gas_limit, 3_000_000);
        assert_eq!(config.restore_policy, RestorePolicy::Registered);
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            rpc_url = "http://node:8545"
            sender = "0x00000000000000000000000000000000000000aa"
            restore_policy = "code_only"
            receipt_poll_interval_ms = 50
        "#;
        let config = BotConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.rpc_url, "http://node:8545");
        assert_eq!(config.sender.map(|a| a.as_slice()[19]), Some(0xaa));
        assert_eq!(config.restore_policy, RestorePolicy::CodeOnly);
        assert_eq!(
            config.confirmation_policy().poll_interval,
            Duration::from_millis(50)
        );
        assert_eq!(config.listen_port, 8080); // default
    }

    #[test]
    fn rpc_settings_carry_sender_and_gas() {
        let config = BotConfig {
            gas_limit: 21_000,
            request_timeout_secs: 5,
            ..Default::default()
        };
        let settings = config.rpc_settings();
        assert_eq!(settings.gas_limit, Some(21_000));
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.sender, None);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_port = 9090").unwrap();
        let config = BotConfig::from_toml_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.listen_port, 9090);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = BotConfig::from_toml_file("/nonexistent/votebox.toml");
        assert!(matches!(result.unwrap_err(), BotError::Config(_)));
    }
}
