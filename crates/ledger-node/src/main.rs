//! # Ledger Node
//!
//! Entry point: load configuration, start the node, wait for Ctrl+C.

use anyhow::Result;
use ledger_node::{NodeConfig, NodeRuntime};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = NodeConfig::from_env();

    let runtime = NodeRuntime::new(config);
    let addrs = runtime.start().await?;
    info!(http = %addrs.http, p2p = %addrs.p2p, "Node is running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    runtime.shutdown();

    Ok(())
}
