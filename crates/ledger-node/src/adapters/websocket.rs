//! # WebSocket Peer Transport
//!
//! Implements the `PeerLink` port over WebSocket text frames and drives the
//! sync service from inbound frames.
//!
//! ## Per-Connection Tasks
//!
//! ```text
//! socket ──read loop──→ ChainSyncApi::handle_frame
//!
//! ChainSyncApi ──PeerLink::send──→ [bounded queue] ──writer task──→ socket
//! ```
//!
//! `PeerLink::send` only enqueues (`try_send`), so a broadcast never waits on
//! a slow peer. The writer bounds every socket write with a timeout and
//! closes the connection when it expires.
//!
//! Every connection, the listener and any in-flight dial stop when the
//! runtime's shutdown signal flips.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chain_sync::{ChainSyncApi, PeerLink, SyncError, SyncMessage};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;

/// `PeerLink` backed by the outgoing queue of one WebSocket connection.
pub struct WsPeerLink {
    remote: String,
    outbox: mpsc::Sender<String>,
}

impl WsPeerLink {
    pub fn new(remote: String, outbox: mpsc::Sender<String>) -> Self {
        Self { remote, outbox }
    }
}

impl PeerLink for WsPeerLink {
    fn remote_addr(&self) -> String {
        self.remote.clone()
    }

    fn send(&self, message: &SyncMessage) -> Result<(), SyncError> {
        let frame = message.encode()?;
        self.outbox.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SyncError::PeerBackpressure(self.remote.clone()),
            mpsc::error::TrySendError::Closed(_) => SyncError::PeerDisconnected,
        })
    }
}

/// Accepts and dials peer connections for one sync service.
#[derive(Clone)]
pub struct PeerTransport {
    sync: Arc<dyn ChainSyncApi>,
    queue_depth: usize,
    send_timeout: Duration,
    shutdown: watch::Receiver<bool>,
}

impl PeerTransport {
    pub fn new(
        sync: Arc<dyn ChainSyncApi>,
        config: &NetworkConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            sync,
            queue_depth: config.peer_queue_depth.max(1),
            send_timeout: config.peer_send_timeout,
            shutdown,
        }
    }

    /// Accept peers on `listener` until shutdown.
    pub async fn listen(self, listener: TcpListener) {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "Listening for peers");
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "Failed to accept peer connection");
                            continue;
                        }
                    };
                    let transport = self.clone();
                    tokio::spawn(async move {
                        match tokio_tungstenite::accept_async(stream).await {
                            Ok(ws) => transport.serve(ws, peer_addr.to_string()).await,
                            Err(e) => warn!(%peer_addr, error = %e, "WebSocket handshake failed"),
                        }
                    });
                }
                _ = stopped(self.shutdown.clone()) => {
                    info!("Peer listener shutting down");
                    break;
                }
            }
        }
    }

    /// Dial `url` in the background; failures are logged and dropped.
    pub fn dial(&self, url: String) -> JoinHandle<()> {
        let transport = self.clone();
        tokio::spawn(async move {
            match transport.connect(&url).await {
                Ok(()) => debug!(%url, "Outbound peer connection closed"),
                Err(e) => warn!(%url, error = %e, "Connection to peer failed"),
            }
        })
    }

    async fn connect(&self, url: &str) -> anyhow::Result<()> {
        let (ws, _response) = tokio::select! {
            dialed = tokio_tungstenite::connect_async(url) => {
                dialed.with_context(|| format!("failed to dial {url}"))?
            }
            _ = stopped(self.shutdown.clone()) => {
                debug!(%url, "Dial abandoned on shutdown");
                return Ok(());
            }
        };
        self.serve(ws, url.to_string()).await;
        Ok(())
    }

    /// Run one connection until it closes or the node shuts down, then
    /// deregister it.
    pub async fn serve<S>(&self, ws: WebSocketStream<S>, remote: String)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut sink, mut stream) = ws.split();
        let (outbox, mut queue) = mpsc::channel::<String>(self.queue_depth);
        let send_timeout = self.send_timeout;

        let id = self
            .sync
            .on_connected(Arc::new(WsPeerLink::new(remote.clone(), outbox)));

        let mut writer = tokio::spawn(async move {
            while let Some(frame) = queue.recv().await {
                match tokio::time::timeout(send_timeout, sink.send(Message::text(frame))).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!(error = %e, "Socket write failed");
                        break;
                    }
                    Err(_) => {
                        warn!(timeout_ms = send_timeout.as_millis() as u64, "Socket write timed out");
                        break;
                    }
                }
            }
        });

        let shutdown = stopped(self.shutdown.clone());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                next = stream.next() => match next {
                    Some(Ok(Message::Text(text))) => self.sync.handle_frame(id, text.as_str()),
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => self.sync.handle_frame(id, text),
                        Err(_) => warn!(connection_id = %id, "Dropping non-UTF-8 frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(connection_id = %id, error = %e, "Socket read failed");
                        break;
                    }
                },
                _ = &mut writer => break,
                _ = &mut shutdown => {
                    debug!(connection_id = %id, "Closing connection on shutdown");
                    break;
                }
            }
        }

        info!(connection_id = %id, %remote, "Connection closed");
        self.sync.on_disconnected(id);
        writer.abort();
    }
}

/// Resolves once shutdown is signalled or the runtime holding the sender is
/// gone.
async fn stopped(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_sync::{ChainSyncService, SyncConfig};
    use tokio_tungstenite::tungstenite::protocol::Role;

    #[tokio::test]
    async fn test_shutdown_closes_and_deregisters_connection() {
        let sync: Arc<dyn ChainSyncApi> = Arc::new(ChainSyncService::new(SyncConfig::default()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let transport =
            PeerTransport::new(Arc::clone(&sync), &NetworkConfig::default(), shutdown_rx);

        let (local, remote) = tokio::io::duplex(4096);
        let local = WebSocketStream::from_raw_socket(local, Role::Server, None).await;
        let mut remote = WebSocketStream::from_raw_socket(remote, Role::Client, None).await;

        let serving =
            tokio::spawn(async move { transport.serve(local, "ws://remote".into()).await });

        // The handshake query lands once the connection is registered.
        let handshake = remote.next().await.unwrap().unwrap();
        assert_eq!(handshake, Message::text(r#"{"type":0}"#));
        assert_eq!(sync.peers(), vec!["ws://remote".to_string()]);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), serving)
            .await
            .unwrap()
            .unwrap();

        assert!(sync.peers().is_empty());
    }

    #[test]
    fn test_link_encodes_into_queue() {
        let (tx, mut rx) = mpsc::channel(4);
        let link = WsPeerLink::new("ws://peer".into(), tx);

        link.send(&SyncMessage::QueryAll).unwrap();

        assert_eq!(rx.try_recv().unwrap(), r#"{"type":1}"#);
        assert_eq!(link.remote_addr(), "ws://peer");
    }

    #[test]
    fn test_full_queue_reports_backpressure() {
        let (tx, _rx) = mpsc::channel(1);
        let link = WsPeerLink::new("ws://slow".into(), tx);

        link.send(&SyncMessage::QueryLatest).unwrap();
        assert!(matches!(
            link.send(&SyncMessage::QueryLatest),
            Err(SyncError::PeerBackpressure(remote)) if remote == "ws://slow"
        ));
    }

    #[test]
    fn test_closed_queue_reports_disconnect() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let link = WsPeerLink::new("ws://gone".into(), tx);

        assert!(matches!(
            link.send(&SyncMessage::QueryLatest),
            Err(SyncError::PeerDisconnected)
        ));
    }
}
