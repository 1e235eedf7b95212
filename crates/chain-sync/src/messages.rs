//! # Peer Wire Protocol
//!
//! One JSON object per frame:
//!
//! ```text
//! {"type": 0}                                   QUERY_LATEST
//! {"type": 1}                                   QUERY_ALL
//! {"type": 2, "data": "<json-encoded Block[]>"} RESPONSE_CHAIN
//! ```
//!
//! Frames are decoded once, here, into [`SyncMessage`]. Nothing past this
//! module sees untyped JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::Block;

const QUERY_LATEST: u8 = 0;
const QUERY_ALL: u8 = 1;
const RESPONSE_CHAIN: u8 = 2;

/// Wire decoding errors.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown message type: {0}")]
    UnknownType(u8),
}

/// Typed peer message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncMessage {
    /// Ask a peer for its tip.
    QueryLatest,
    /// Ask a peer for its whole chain.
    QueryAll,
    /// Chain data: a single tip or a full chain.
    ResponseChain(Vec<Block>),
}

/// Raw frame layout.
#[derive(Serialize, Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

impl SyncMessage {
    /// `RESPONSE_CHAIN` carrying only `tip`.
    pub fn latest(tip: &Block) -> Self {
        Self::ResponseChain(vec![tip.clone()])
    }

    /// `RESPONSE_CHAIN` carrying the whole `chain`.
    pub fn chain(chain: &[Block]) -> Self {
        Self::ResponseChain(chain.to_vec())
    }

    /// Name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QueryLatest => "QUERY_LATEST",
            Self::QueryAll => "QUERY_ALL",
            Self::ResponseChain(_) => "RESPONSE_CHAIN",
        }
    }

    /// Encodes into a text frame.
    pub fn encode(&self) -> Result<String, WireError> {
        let frame = match self {
            Self::QueryLatest => Frame {
                kind: QUERY_LATEST,
                data: None,
            },
            Self::QueryAll => Frame {
                kind: QUERY_ALL,
                data: None,
            },
            Self::ResponseChain(blocks) => Frame {
                kind: RESPONSE_CHAIN,
                data: Some(serde_json::to_string(blocks)?),
            },
        };
        Ok(serde_json::to_string(&frame)?)
    }

    /// Decodes a text frame.
    ///
    /// A `RESPONSE_CHAIN` whose `data` is missing, `null` or not a block
    /// array decodes as an empty chain rather than an error.
    pub fn decode(text: &str) -> Result<Self, WireError> {
        let frame: Frame = serde_json::from_str(text)?;
        match frame.kind {
            QUERY_LATEST => Ok(Self::QueryLatest),
            QUERY_ALL => Ok(Self::QueryAll),
            RESPONSE_CHAIN => Ok(Self::ResponseChain(decode_blocks(frame.data.as_deref()))),
            other => Err(WireError::UnknownType(other)),
        }
    }
}

fn decode_blocks(data: Option<&str>) -> Vec<Block> {
    let Some(data) = data else {
        return Vec::new();
    };
    match serde_json::from_str::<Option<Vec<Block>>>(data) {
        Ok(blocks) => blocks.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Unparseable chain payload, treating as empty");
            Vec::new()
        }
    }
}
