//! # CLI Interface
//!
//! Defines the command-line argument structure for `tally-node` using
//! `clap` derive. Supports four subcommands: `run`, `wallet`, `status`,
//! and `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use tally_ledger::config::{DEFAULT_DATA_DIR, DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};

/// Tally wallet ledger node.
///
/// Serves wallet creation, balance queries, payments, and transaction
/// history over HTTP, backed by a local sled database. Exposes Prometheus
/// metrics on a separate port.
#[derive(Parser, Debug)]
#[command(
    name = "tally-node",
    about = "Tally wallet ledger node",
    version,
    propagate_version = true
)]
pub struct TallyNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Tally node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the ledger node.
    Run(RunArgs),
    /// Talk to a running node's wallet RPC.
    Wallet(WalletArgs),
    /// Query the status of a running node.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Log output format, selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory holding the sled database. Created on first run.
    #[arg(long, short = 'd', env = "TALLY_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Port for the wallet RPC and status API.
    #[arg(long, env = "TALLY_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "TALLY_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format.
    #[arg(long, env = "TALLY_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,

    /// Keep all state in memory. Nothing survives a restart.
    #[arg(long)]
    pub ephemeral: bool,
}

/// Arguments for the `wallet` subcommand.
#[derive(Parser, Debug)]
pub struct WalletArgs {
    /// Base URL of the running node.
    #[arg(long, env = "TALLY_RPC_URL", default_value = "http://127.0.0.1:4001")]
    pub rpc_url: String,

    #[command(subcommand)]
    pub action: WalletAction,
}

/// Wallet operations exposed by the node.
#[derive(Subcommand, Debug)]
pub enum WalletAction {
    /// Create a wallet, optionally funded.
    Create {
        #[arg(long, default_value_t = 0)]
        initial_balance: u64,
    },
    /// Print a wallet's balance.
    Balance { wallet_id: String },
    /// Send funds from a wallet to an address.
    Send {
        wallet_id: String,
        to_address: String,
        amount: u64,
    },
    /// List a wallet's outgoing transactions.
    Transactions { wallet_id: String },
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Base URL of the running node.
    #[arg(long, env = "TALLY_RPC_URL", default_value = "http://127.0.0.1:4001")]
    pub rpc_url: String,
}
