//! # Control Surface
//!
//! HTTP API used by a local operator.
//!
//! | Method | Path         | Effect                                   |
//! |--------|--------------|------------------------------------------|
//! | GET    | `/blocks`    | whole local chain                        |
//! | POST   | `/mineBlock` | append `{"data": ..}` and gossip the tip |
//! | GET    | `/peers`     | remote addresses of open connections     |
//! | POST   | `/addPeer`   | dial `{"peer": "ws://.."}`               |

mod routes;

pub use routes::{build_router, AddPeerRequest, ApiState, MineBlockRequest};
