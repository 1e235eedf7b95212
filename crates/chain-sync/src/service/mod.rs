//! # Chain Sync Service
//!
//! The single owner of the local chain. Every path that reads the tip,
//! mutates the chain and gossips the result runs inside one mutex, whether
//! it was triggered by a local submission or by any peer message.
//!
//! ## Message Handling
//!
//! | Inbound          | Effect                                               |
//! |------------------|------------------------------------------------------|
//! | `QueryLatest`    | reply to sender with `[tip]`                         |
//! | `QueryAll`       | reply to sender with the whole chain                 |
//! | `ResponseChain`  | resolve; gossip new tip, or request the full chain   |
//!
//! ## Connection Lifecycle
//!
//! A new connection is registered and immediately sent `QueryLatest`, so a
//! node learns right away whether the peer is ahead. Closed connections are
//! deregistered.

mod error;

#[cfg(test)]
mod tests;

pub use error::SyncError;

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{append_if_valid, genesis_block, resolve, Block, Resolution};
use crate::messages::SyncMessage;
use crate::ports::inbound::ChainSyncApi;
use crate::ports::outbound::{PeerLink, SystemTimeSource, TimeSource};
use crate::registry::{ConnectionId, ConnectionRegistry};

/// Who receives the `QueryAll` issued when only a non-linking tip is known.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryAllScope {
    /// Every open connection.
    #[default]
    Broadcast,
    /// Only the connection that reported the tip.
    Origin,
}

/// Service configuration.
#[derive(Clone, Debug, Default)]
pub struct SyncConfig {
    pub query_all_scope: QueryAllScope,
}

/// Synchronization service.
///
/// Thread-safe; share it across tasks behind an `Arc`.
pub struct ChainSyncService<T: TimeSource = SystemTimeSource> {
    config: SyncConfig,
    chain: Mutex<Vec<Block>>,
    registry: ConnectionRegistry,
    clock: T,
}

impl ChainSyncService<SystemTimeSource> {
    /// Service starting from the genesis block, stamped by the system clock.
    pub fn new(config: SyncConfig) -> Self {
        Self::with_clock(config, SystemTimeSource)
    }
}

impl<T: TimeSource> ChainSyncService<T> {
    pub fn with_clock(config: SyncConfig, clock: T) -> Self {
        Self {
            config,
            chain: Mutex::new(vec![genesis_block()]),
            registry: ConnectionRegistry::new(),
            clock,
        }
    }

    /// Number of blocks in the local chain.
    pub fn height(&self) -> usize {
        self.chain.lock().len()
    }

    fn reply(&self, origin: ConnectionId, message: SyncMessage) {
        if let Err(e) = self.registry.send_to(origin, &message) {
            warn!(
                connection_id = %origin,
                message = message.kind(),
                error = %e,
                "Failed to reply to peer"
            );
        }
    }

    fn handle_chain_response(&self, origin: ConnectionId, received: Vec<Block>) {
        let mut chain = self.chain.lock();
        let resolution = resolve(&mut chain, received);
        debug!(connection_id = %origin, ?resolution, "Resolved chain response");

        match resolution {
            Resolution::Extended | Resolution::Replaced => {
                if let Some(tip) = chain.last() {
                    self.registry.broadcast(&SyncMessage::latest(tip));
                }
            }
            Resolution::RequestFull => match self.config.query_all_scope {
                QueryAllScope::Broadcast => {
                    self.registry.broadcast(&SyncMessage::QueryAll);
                }
                QueryAllScope::Origin => self.reply(origin, SyncMessage::QueryAll),
            },
            Resolution::Rejected | Resolution::Ignored => {}
        }
    }
}

impl<T: TimeSource> ChainSyncApi for ChainSyncService<T> {
    fn submit_block(&self, data: String) -> Result<Block, SyncError> {
        let mut chain = self.chain.lock();
        let tip = chain.last().cloned().unwrap_or_else(genesis_block);
        let block = Block::next(&tip, data, self.clock.now());

        append_if_valid(&mut chain, block.clone()).map_err(|e| {
            warn!(error = %e, "Local block submission rejected");
            SyncError::SubmissionRejected(e)
        })?;

        info!(index = block.index, hash = block.short_hash(), "Block added");
        self.registry.broadcast(&SyncMessage::latest(&block));
        Ok(block)
    }

    fn blocks(&self) -> Vec<Block> {
        self.chain.lock().clone()
    }

    fn latest_block(&self) -> Block {
        self.chain.lock().last().cloned().unwrap_or_else(genesis_block)
    }

    fn peers(&self) -> Vec<String> {
        self.registry.peers()
    }

    fn request_latest_from_all(&self) -> usize {
        self.registry.broadcast(&SyncMessage::QueryLatest)
    }

    fn on_connected(&self, link: Arc<dyn PeerLink>) -> ConnectionId {
        let remote = link.remote_addr();
        let id = self.registry.register(link);
        info!(connection_id = %id, %remote, "Peer connected");

        if let Err(e) = self.registry.send_to(id, &SyncMessage::QueryLatest) {
            warn!(connection_id = %id, error = %e, "Handshake query failed, dropping peer");
            self.registry.deregister(id);
        }
        id
    }

    fn on_disconnected(&self, id: ConnectionId) {
        if self.registry.deregister(id) {
            info!(connection_id = %id, "Peer disconnected");
        }
    }

    fn handle_message(&self, origin: ConnectionId, message: SyncMessage) {
        debug!(connection_id = %origin, message = message.kind(), "Received message");
        match message {
            SyncMessage::QueryLatest => {
                let tip = self.latest_block();
                self.reply(origin, SyncMessage::latest(&tip));
            }
            SyncMessage::QueryAll => {
                let chain = self.blocks();
                self.reply(origin, SyncMessage::ResponseChain(chain));
            }
            SyncMessage::ResponseChain(blocks) => self.handle_chain_response(origin, blocks),
        }
    }

    fn handle_frame(&self, origin: ConnectionId, frame: &str) {
        match SyncMessage::decode(frame) {
            Ok(message) => self.handle_message(origin, message),
            Err(e) => warn!(connection_id = %origin, error = %e, "Dropping undecodable frame"),
        }
    }
}
