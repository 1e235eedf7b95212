//! # Block Entity
//!
//! A block is one ledger entry linked to its predecessor by hash.
//!
//! ## Hash Rule
//!
//! ```text
//! hash = hex(SHA-256( index ‖ previous_hash ‖ timestamp ‖ data ))
//! ```
//!
//! Integers are rendered in decimal and the four strings are concatenated
//! without separators. Every node in a deployment must agree on this rule.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Index of the genesis block.
pub const GENESIS_INDEX: u64 = 0;
/// Previous-hash sentinel carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
/// Creation time of the genesis block (seconds since epoch).
pub const GENESIS_TIMESTAMP: u64 = 1_465_154_705;
/// Payload of the genesis block.
pub const GENESIS_DATA: &str = "my genesis block!!";
/// Precomputed hash of the genesis block.
pub const GENESIS_HASH: &str = "816534932c2b7154836da6afc367695e6337db8a921823784c14378abed4f7d7";

/// A single ledger entry.
///
/// Serialized with camelCase field names so that peers exchange
/// `{"index":..,"previousHash":..,"timestamp":..,"data":..,"hash":..}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the chain (0 = genesis).
    pub index: u64,
    /// Hash of the preceding block, `"0"` for genesis.
    pub previous_hash: String,
    /// Creation time in seconds since epoch.
    pub timestamp: u64,
    /// Opaque payload.
    pub data: String,
    /// Self-certifying hash over the other four fields.
    pub hash: String,
}

impl Block {
    /// Creates a block with an explicitly provided hash.
    ///
    /// No check is made that `hash` matches the fields; use
    /// [`Block::is_well_formed`] for that.
    pub fn new(
        index: u64,
        previous_hash: impl Into<String>,
        timestamp: u64,
        data: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            previous_hash: previous_hash.into(),
            timestamp,
            data: data.into(),
            hash: hash.into(),
        }
    }

    /// Builds the successor of `previous` carrying `data`, stamped at `now`.
    ///
    /// Side-effect free: the caller decides whether to append it.
    pub fn next(previous: &Block, data: impl Into<String>, now: u64) -> Self {
        let index = previous.index + 1;
        let data = data.into();
        let hash = calculate_hash(index, &previous.hash, now, &data);
        Self {
            index,
            previous_hash: previous.hash.clone(),
            timestamp: now,
            data,
            hash,
        }
    }

    /// Recomputes the hash over this block's own fields.
    pub fn computed_hash(&self) -> String {
        calculate_hash(self.index, &self.previous_hash, self.timestamp, &self.data)
    }

    /// True iff the stored hash equals the recomputed one.
    pub fn is_well_formed(&self) -> bool {
        self.computed_hash() == self.hash
    }

    /// True iff this block is field-for-field the genesis constant.
    pub fn is_genesis(&self) -> bool {
        *self == genesis_block()
    }

    /// First eight hex chars of the hash, for log lines.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(self.hash.as_str())
    }
}

/// Digest of a block's fields.
pub fn calculate_hash(index: u64, previous_hash: &str, timestamp: u64, data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(previous_hash.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// The fixed first block shared by every valid chain.
pub fn genesis_block() -> Block {
    Block::new(
        GENESIS_INDEX,
        GENESIS_PREVIOUS_HASH,
        GENESIS_TIMESTAMP,
        GENESIS_DATA,
        GENESIS_HASH,
    )
}
