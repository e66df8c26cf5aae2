// Copyright (c) 2026 Tally Contributors. MIT License.
// See LICENSE for details.

//! # Tally Ledger Node
//!
//! Entry point for the `tally-node` binary. Parses CLI arguments, initializes
//! logging and metrics, opens the wallet store, and serves the HTTP API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     : start the ledger node
//! - `wallet`  : call a running node's wallet RPC
//! - `status`  : query a running node's status endpoint
//! - `version` : print build version information

mod api;
mod cli;
mod client;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use tally_ledger::identity::ServiceIdentity;
use tally_ledger::{Dispatcher, DurableStore, LedgerService, MemoryStore, SledStore};

use cli::{Commands, TallyNodeCli, WalletAction};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TallyNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Wallet(args) => wallet_command(args).await,
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the ledger node: wallet API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, args.log_format.into());

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        ephemeral = args.ephemeral,
        "starting tally-node"
    );

    // --- Durable storage ---
    let store: Arc<dyn DurableStore> = if args.ephemeral {
        tracing::warn!("running with an in-memory store; state is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        std::fs::create_dir_all(&args.data_dir).with_context(|| {
            format!(
                "failed to create data directory: {}",
                args.data_dir.display()
            )
        })?;
        let db = SledStore::open(&args.data_dir).with_context(|| {
            format!("failed to open database at {}", args.data_dir.display())
        })?;
        tracing::info!(
            path = %args.data_dir.display(),
            wallets = db.wallet_count(),
            "database opened"
        );
        Arc::new(db)
    };

    // --- Identity ---
    let identity = ServiceIdentity::load_or_init(store.as_ref())
        .await
        .context("failed to initialize service identity")?;
    let public_key = identity.public_key_hex();
    tracing::info!(public_key = %public_key, "service identity ready");

    // --- Ledger ---
    let ledger = Arc::new(LedgerService::new(Arc::clone(&store)));
    let dispatcher = Arc::new(Dispatcher::new(ledger));

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (ledger {})",
            env!("CARGO_PKG_VERSION"),
            tally_ledger::config::LEDGER_VERSION,
        ),
        public_key,
        dispatcher,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    // In-flight requests finish before the API server returns; payments
    // already handed to the ledger complete on their own tasks.
    let metrics_server = tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, metrics_router).await {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    if let Err(e) = axum::serve(api_listener, api_router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("API server error: {}", e);
    }

    metrics_server.abort();
    tracing::info!("tally-node stopped");
    Ok(())
}

/// Runs one wallet RPC against a running node and prints the JSON reply.
async fn wallet_command(args: cli::WalletArgs) -> Result<()> {
    let (method, params) = match args.action {
        WalletAction::Create { initial_balance } => (
            "createWallet",
            serde_json::json!({ "initialBalance": initial_balance }),
        ),
        WalletAction::Balance { wallet_id } => {
            ("getBalance", serde_json::json!({ "walletId": wallet_id }))
        }
        WalletAction::Send {
            wallet_id,
            to_address,
            amount,
        } => (
            "sendPayment",
            serde_json::json!({
                "walletId": wallet_id,
                "toAddress": to_address,
                "amount": amount,
            }),
        ),
        WalletAction::Transactions { wallet_id } => (
            "listTransactions",
            serde_json::json!({ "walletId": wallet_id }),
        ),
    };

    let url = format!("{}/rpc/{}", args.rpc_url.trim_end_matches('/'), method);
    let body = client::post(&url, &serde_json::to_vec(&params)?).await?;
    println!("{}", body);

    let reply: serde_json::Value =
        serde_json::from_str(&body).context("node returned a non-JSON body")?;
    if let Some(error) = reply.get("error").and_then(|e| e.as_str()) {
        anyhow::bail!("{} failed: {}", method, error);
    }
    Ok(())
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.rpc_url.trim_end_matches('/'));
    let body = client::get(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("tally-node {}", env!("CARGO_PKG_VERSION"));
    println!("ledger     {}", tally_ledger::config::LEDGER_VERSION);
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed that branch never completes.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining connections");
}
