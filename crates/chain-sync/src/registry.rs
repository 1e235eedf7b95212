//! # Connection Registry
//!
//! The set of currently open peer connections, used for targeted replies
//! and broadcast. Broadcast order is irrelevant.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::messages::SyncMessage;
use crate::ports::outbound::PeerLink;
use crate::service::SyncError;

/// Registry key for one open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Active peer connections.
#[derive(Default)]
pub struct ConnectionRegistry {
    links: RwLock<HashMap<ConnectionId, Arc<dyn PeerLink>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the active set.
    pub fn register(&self, link: Arc<dyn PeerLink>) -> ConnectionId {
        let id = ConnectionId::new();
        debug!(connection_id = %id, remote = %link.remote_addr(), "Registered connection");
        self.links.write().insert(id, link);
        id
    }

    /// Remove a connection. Returns false if it was not registered.
    pub fn deregister(&self, id: ConnectionId) -> bool {
        let removed = self.links.write().remove(&id).is_some();
        if removed {
            debug!(connection_id = %id, "Deregistered connection");
        }
        removed
    }

    /// Send to a single connection.
    pub fn send_to(&self, id: ConnectionId, message: &SyncMessage) -> Result<(), SyncError> {
        let link = self
            .links
            .read()
            .get(&id)
            .cloned()
            .ok_or(SyncError::UnknownConnection(id))?;
        link.send(message)
    }

    /// Send to every connection independently.
    ///
    /// Returns the number of connections the message was handed to.
    pub fn broadcast(&self, message: &SyncMessage) -> usize {
        let links: Vec<(ConnectionId, Arc<dyn PeerLink>)> = self
            .links
            .read()
            .iter()
            .map(|(id, link)| (*id, Arc::clone(link)))
            .collect();

        let mut reached = 0;
        for (id, link) in links {
            match link.send(message) {
                Ok(()) => reached += 1,
                Err(e) => warn!(
                    connection_id = %id,
                    message = message.kind(),
                    error = %e,
                    "Broadcast to peer failed"
                ),
            }
        }
        debug!(message = message.kind(), reached, "Broadcast complete");
        reached
    }

    /// Remote addresses of all registered connections.
    pub fn peers(&self) -> Vec<String> {
        self.links
            .read()
            .values()
            .map(|link| link.remote_addr())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.links.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.read().is_empty()
    }
}
