//! votebox daemon: entry point for running the voting bot.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use votebox_bot::{Bot, BotConfig, BotServer};
use votebox_contract::JsonRpcBackend;
use votebox_session::{RestorePolicy, SessionManager};
use votebox_types::Address;
use votebox_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "votebox-daemon", about = "Contract-backed voting bot")]
struct Cli {
    /// JSON-RPC endpoint of the Ethereum node.
    #[arg(long, env = "VOTEBOX_RPC_URL")]
    rpc_url: Option<String>,

    /// Account used to send transactions (defaults to the node's first account).
    #[arg(long, env = "VOTEBOX_SENDER")]
    sender: Option<Address>,

    /// Gas limit attached to every transaction.
    #[arg(long, env = "VOTEBOX_GAS_LIMIT")]
    gas_limit: Option<u64>,

    /// Seconds to wait for a transaction receipt.
    #[arg(long, env = "VOTEBOX_RECEIPT_TIMEOUT")]
    receipt_timeout_secs: Option<u64>,

    /// Webhook server port.
    #[arg(long, env = "VOTEBOX_LISTEN_PORT")]
    listen_port: Option<u16>,

    /// Seconds of inactivity before a user's conversation state is dropped.
    #[arg(long, env = "VOTEBOX_IDLE_TIMEOUT")]
    idle_timeout_secs: Option<u64>,

    /// Which polls /open may attach to: "registered" or "code_only".
    #[arg(long, env = "VOTEBOX_RESTORE_POLICY", value_parser = parse_restore_policy)]
    restore_policy: Option<RestorePolicy>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VOTEBOX_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VOTEBOX_LOG_LEVEL")]
    log_level: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VOTEBOX_CONFIG")]
    config: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Connect to the node and serve the webhook.
    Run,
    /// Print the effective configuration as TOML.
    Config,
}

fn parse_restore_policy(s: &str) -> Result<RestorePolicy, String> {
    match s {
        "registered" => Ok(RestorePolicy::Registered),
        "code_only" => Ok(RestorePolicy::CodeOnly),
        other => Err(format!(
            "unknown restore policy {other:?} (expected \"registered\" or \"code_only\")"
        )),
    }
}

impl Cli {
    /// Layer CLI flags and env vars over the file (or default) config.
    fn into_config(self) -> anyhow::Result<(BotConfig, Command)> {
        let base = match &self.config {
            Some(path) => BotConfig::from_toml_file(path)
                .with_context(|| format!("loading config from {path}"))?,
            None => BotConfig::default(),
        };
        let config = BotConfig {
            rpc_url: self.rpc_url.unwrap_or(base.rpc_url),
            sender: self.sender.or(base.sender),
            gas_limit: self.gas_limit.unwrap_or(base.gas_limit),
            receipt_timeout_secs: self.receipt_timeout_secs.unwrap_or(base.receipt_timeout_secs),
            listen_port: self.listen_port.unwrap_or(base.listen_port),
            idle_timeout_secs: self.idle_timeout_secs.unwrap_or(base.idle_timeout_secs),
            restore_policy: self.restore_policy.unwrap_or(base.restore_policy),
            log_format: self.log_format.unwrap_or(base.log_format),
            log_level: self.log_level.unwrap_or(base.log_level),
            ..base
        };
        Ok((config, self.command))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, command) = Cli::parse().into_config()?;

    match command {
        Command::Config => {
            print!("{}", config.to_toml_string());
            Ok(())
        }
        Command::Run => run(config).await,
    }
}

async fn run(config: BotConfig) -> anyhow::Result<()> {
    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level);

    let backend = JsonRpcBackend::connect(config.rpc_settings())
        .await
        .with_context(|| format!("connecting to {}", config.rpc_url))?;
    tracing::info!(
        url = backend.url(),
        sender = %backend.sender(),
        policy = ?config.restore_policy,
        "connected to node"
    );

    let manager = SessionManager::new(
        Arc::new(backend),
        config.confirmation_policy(),
        config.restore_policy,
    );
    let bot = Arc::new(Bot::new(manager));

    let idle_timeout = config.idle_timeout();
    let sweeper = {
        let bot = Arc::clone(&bot);
        tokio::spawn(async move {
            let period = (idle_timeout / 4).max(Duration::from_secs(1));
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let dropped = bot.users().expire_idle(idle_timeout).await;
                if dropped > 0 {
                    tracing::debug!(dropped, "expired idle conversations");
                }
            }
        })
    };

    let server = BotServer::new(config.listen_port, bot);
    let result = server
        .start(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received, stopping server");
        })
        .await;
    sweeper.abort();
    result?;

    tracing::info!("votebox daemon exited cleanly");
    Ok(())
}
