//! Error types for the synchronization service

use thiserror::Error;

use crate::domain::ValidationError;
use crate::messages::WireError;
use crate::registry::ConnectionId;

/// Chain sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Submission rejected: {0}")]
    SubmissionRejected(ValidationError),

    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    #[error("Peer send queue full: {0}")]
    PeerBackpressure(String),

    #[error("Peer disconnected")]
    PeerDisconnected,

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),
}
