//! # Port Adapters
//!
//! Implementations of the chain-sync outbound ports.

pub mod websocket;

pub use websocket::{PeerTransport, WsPeerLink};
