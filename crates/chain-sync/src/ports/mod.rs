//! Port definitions for Chain Sync
//!
//! - `inbound`: the API driven by transports and the control surface
//! - `outbound`: what the service needs from the outside world

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
