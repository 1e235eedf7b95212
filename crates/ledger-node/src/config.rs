//! # Node Configuration
//!
//! Configuration for the peer transport, control surface and sync service.
//! Values come from the process environment; anything unset or malformed
//! keeps its default.

use std::time::Duration;

use chain_sync::{QueryAllScope, SyncConfig};
use thiserror::Error;
use tracing::warn;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Network configuration.
    pub network: NetworkConfig,
    /// Synchronization configuration.
    pub sync: SyncSettings,
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("HTTP and P2P ports must differ (both set to {0})")]
    PortClash(u16),
}

/// Network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// HTTP control surface port.
    pub http_port: u16,
    /// Peer WebSocket listening port.
    pub p2p_port: u16,
    /// Peer URLs dialed at startup.
    pub bootstrap_peers: Vec<String>,
    /// Outgoing frames buffered per connection before sends are dropped.
    pub peer_queue_depth: usize,
    /// Upper bound on a single socket write.
    pub peer_send_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_port: 3001,
            p2p_port: 6001,
            bootstrap_peers: Vec::new(),
            peer_queue_depth: 64,
            peer_send_timeout: Duration::from_secs(5),
        }
    }
}

/// Synchronization configuration.
#[derive(Debug, Clone, Default)]
pub struct SyncSettings {
    /// Interval of the periodic `QUERY_LATEST` broadcast; `None` disables it.
    pub resync_interval: Option<Duration>,
    /// Recipients of the full-chain query.
    pub query_all_scope: QueryAllScope,
}

impl SyncSettings {
    pub fn service_config(&self) -> SyncConfig {
        SyncConfig {
            query_all_scope: self.query_all_scope,
        }
    }
}

impl NodeConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = parse_var(&lookup, "HTTP_PORT") {
            config.network.http_port = port;
        }
        if let Some(port) = parse_var(&lookup, "P2P_PORT") {
            config.network.p2p_port = port;
        }
        if let Some(peers) = lookup("PEERS") {
            config.network.bootstrap_peers = peers
                .split(',')
                .map(str::trim)
                .filter(|peer| !peer.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(depth) = parse_var::<usize, _>(&lookup, "PEER_QUEUE_DEPTH") {
            if depth == 0 {
                warn!("PEER_QUEUE_DEPTH must be positive, keeping default");
            } else {
                config.network.peer_queue_depth = depth;
            }
        }
        if let Some(ms) = parse_var(&lookup, "PEER_SEND_TIMEOUT_MS") {
            config.network.peer_send_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "RESYNC_INTERVAL_SECS") {
            config.sync.resync_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(scope) = lookup("QUERY_ALL_SCOPE") {
            match scope.trim().to_ascii_lowercase().as_str() {
                "broadcast" => config.sync.query_all_scope = QueryAllScope::Broadcast,
                "origin" => config.sync.query_all_scope = QueryAllScope::Origin,
                other => warn!(value = other, "QUERY_ALL_SCOPE must be broadcast or origin"),
            }
        }

        config
    }

    /// Reject configurations the node cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Port 0 asks the OS for an ephemeral port, which never clashes.
        if self.network.http_port != 0 && self.network.http_port == self.network.p2p_port {
            return Err(ConfigError::PortClash(self.network.http_port));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring malformed environment variable");
            None
        }
    }
}
