//! # Domain Layer for Chain Sync
//!
//! Pure business logic with no I/O dependencies. This is the innermost layer
//! of the hexagonal architecture.
//!
//! ## Contents
//!
//! - **block**: `Block`, the hash function and the genesis constant
//! - **validation**: successor and whole-chain checks
//! - **resolver**: the longest-valid-chain decision (`resolve`)
//! - **error**: `ValidationError`

mod block;
mod error;
mod resolver;
mod validation;

pub use block::*;
pub use error::*;
pub use resolver::*;
pub use validation::*;
