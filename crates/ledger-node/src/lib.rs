//! # Ledger Node
//!
//! Runtime around the `chain-sync` service.
//!
//! ## Modular Structure
//!
//! - `config` - environment-driven configuration
//! - `adapters` - WebSocket peer transport implementing `PeerLink`
//! - `api` - HTTP control surface
//! - `runtime` - startup wiring and shutdown

pub mod adapters;
pub mod api;
pub mod config;
pub mod runtime;

pub use config::{ConfigError, NetworkConfig, NodeConfig, SyncSettings};
pub use runtime::{BoundAddrs, NodeRuntime};
