//! Inbound ports (API) for Chain Sync.

use std::sync::Arc;

use crate::domain::Block;
use crate::messages::SyncMessage;
use crate::ports::outbound::PeerLink;
use crate::registry::ConnectionId;
use crate::service::SyncError;

/// Primary API of the synchronization service.
///
/// Called by the peer transport (connection lifecycle and inbound frames)
/// and by the operator control surface (submission and reads).
pub trait ChainSyncApi: Send + Sync {
    /// Build a block on top of the current tip, append it and gossip it.
    fn submit_block(&self, data: String) -> Result<Block, SyncError>;

    /// Snapshot of the whole local chain.
    fn blocks(&self) -> Vec<Block>;

    /// Current tip.
    fn latest_block(&self) -> Block;

    /// Remote addresses of all open connections.
    fn peers(&self) -> Vec<String>;

    /// Ask every open connection for its tip. Returns the number reached.
    fn request_latest_from_all(&self) -> usize;

    /// Register a freshly opened connection and send it the handshake query.
    fn on_connected(&self, link: Arc<dyn PeerLink>) -> ConnectionId;

    /// Forget a closed or failed connection. Idempotent.
    fn on_disconnected(&self, id: ConnectionId);

    /// Dispatch a decoded message received on `origin`.
    fn handle_message(&self, origin: ConnectionId, message: SyncMessage);

    /// Decode and dispatch a raw text frame received on `origin`.
    fn handle_frame(&self, origin: ConnectionId, frame: &str);
}
