//! # Chain Sync
//!
//! Hash-linked ledger replicated across peers. Each node accepts blocks,
//! validates them locally and reconciles divergence with a small gossip
//! exchange under the longest-valid-chain rule.
//!
//! ## Architecture Role
//!
//! ```text
//! [Operator] ──submit_block──→ [ChainSyncService] ←──frames── [Peer A]
//!                                    │    ↑                      [Peer B] ...
//!                                 resolve │
//!                                    ↓    │
//!                              [Local Chain]
//!                                    │
//!                                    ↓ broadcast
//!                           [ConnectionRegistry] ──→ every peer
//! ```
//!
//! ## Layers
//!
//! - `domain`: blocks, hashing, validation and the resolver (pure, no I/O)
//! - `messages`: the typed wire protocol and its JSON codec
//! - `registry`: the set of open peer connections
//! - `ports`: the seams to transports and clocks
//! - `service`: the single owner of the local chain

pub mod domain;
pub mod messages;
pub mod ports;
pub mod registry;
pub mod service;

pub use domain::*;
pub use messages::{SyncMessage, WireError};
pub use ports::inbound::ChainSyncApi;
pub use ports::outbound::{PeerLink, SystemTimeSource, TimeSource};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use service::{ChainSyncService, QueryAllScope, SyncConfig, SyncError};
