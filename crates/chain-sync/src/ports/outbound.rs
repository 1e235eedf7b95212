//! Outbound ports (SPI) for Chain Sync.

use crate::messages::SyncMessage;
use crate::service::SyncError;

/// One open peer connection.
///
/// Implementations must not block: a send either enqueues the message or
/// fails immediately, so a stalled peer never holds up the caller.
pub trait PeerLink: Send + Sync {
    /// Address the connection was opened to or accepted from.
    fn remote_addr(&self) -> String;

    /// Best-effort send of one message.
    fn send(&self, message: &SyncMessage) -> Result<(), SyncError>;
}

/// Time source for block timestamps
pub trait TimeSource: Send + Sync {
    /// Get current unix timestamp in seconds
    fn now(&self) -> u64;
}

/// Default time source using system time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
