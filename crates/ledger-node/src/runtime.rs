//! # Node Runtime
//!
//! Owns the sync service and the tasks around it.
//!
//! ## Startup Sequence
//!
//! 1. Bind the peer and HTTP listeners
//! 2. Spawn the peer listener and the HTTP server
//! 3. Dial bootstrap peers
//! 4. Start the re-sync timer (if configured)

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use chain_sync::{ChainSyncApi, ChainSyncService};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::adapters::PeerTransport;
use crate::api::{build_router, ApiState};
use crate::config::NodeConfig;

/// Addresses the node actually bound.
#[derive(Debug, Clone, Copy)]
pub struct BoundAddrs {
    pub http: SocketAddr,
    pub p2p: SocketAddr,
}

/// The running node.
pub struct NodeRuntime {
    config: NodeConfig,
    sync: Arc<dyn ChainSyncApi>,
    transport: PeerTransport,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Self {
        let sync: Arc<dyn ChainSyncApi> =
            Arc::new(ChainSyncService::new(config.sync.service_config()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let transport =
            PeerTransport::new(Arc::clone(&sync), &config.network, shutdown_rx.clone());

        Self {
            config,
            sync,
            transport,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Handle to the sync service.
    pub fn sync(&self) -> Arc<dyn ChainSyncApi> {
        Arc::clone(&self.sync)
    }

    /// Bind listeners and spawn every background task.
    pub async fn start(&self) -> Result<BoundAddrs> {
        self.config
            .validate()
            .context("Invalid node configuration")?;

        let p2p_listener = bind(self.config.network.p2p_port)
            .await
            .context("Failed to bind peer listener")?;
        let http_listener = bind(self.config.network.http_port)
            .await
            .context("Failed to bind HTTP listener")?;
        let addrs = BoundAddrs {
            http: http_listener.local_addr()?,
            p2p: p2p_listener.local_addr()?,
        };

        tokio::spawn(self.transport.clone().listen(p2p_listener));

        let router = build_router(ApiState {
            sync: Arc::clone(&self.sync),
            transport: self.transport.clone(),
        });
        let mut http_shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            let server = axum::serve(http_listener, router).with_graceful_shutdown(async move {
                let _ = http_shutdown.changed().await;
            });
            if let Err(e) = server.await {
                error!(error = %e, "HTTP server error");
            }
        });
        info!(addr = %addrs.http, "Listening for HTTP");

        for peer in &self.config.network.bootstrap_peers {
            info!(%peer, "Dialing bootstrap peer");
            self.transport.dial(peer.clone());
        }

        if let Some(interval) = self.config.sync.resync_interval {
            self.spawn_resync(interval);
        }

        Ok(addrs)
    }

    fn spawn_resync(&self, period: std::time::Duration) {
        let sync = Arc::clone(&self.sync);
        let mut shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; the handshake already covers it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reached = sync.request_latest_from_all();
                        debug!(reached, "Periodic re-sync query sent");
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
        info!(period_secs = period.as_secs(), "Periodic re-sync enabled");
    }

    /// Signal every task to stop.
    pub fn shutdown(&self) {
        info!("Initiating shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
    }
}

async fn bind(port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await
}
