//! # Longest-Valid-Chain Resolver
//!
//! Decides what to do with chain data reported by a peer.
//!
//! ## Decision Table
//!
//! ```text
//! received tip index <= held tip index         → Ignored
//! received tip links onto held tip             → Extended   (append one block)
//! single non-linking tip                       → RequestFull (ask for whole chain)
//! multi-block, valid and strictly longer       → Replaced
//! anything else                                → Rejected
//! ```
//!
//! The resolver holds no state of its own; the chain it is handed is the
//! only thing it reads or writes.

use tracing::{debug, info, warn};

use super::{validate_chain, validate_successor, Block, ValidationResult};

/// Outcome of one [`resolve`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Local chain is at least as long; nothing changes, nothing is sent.
    Ignored,
    /// The received tip was appended to the local chain.
    Extended,
    /// Only a non-linking tip is known; the full chain must be requested.
    RequestFull,
    /// The local chain was replaced by the received one.
    Replaced,
    /// The received data was not adopted.
    Rejected,
}

impl Resolution {
    /// True if the local chain changed and the new tip should be gossiped.
    pub fn changed_chain(&self) -> bool {
        matches!(self, Self::Extended | Self::Replaced)
    }
}

/// Appends `candidate` if it is a valid successor of the current tip.
///
/// On rejection `chain` is left untouched.
pub fn append_if_valid(chain: &mut Vec<Block>, candidate: Block) -> ValidationResult<()> {
    if let Some(tip) = chain.last() {
        validate_successor(&candidate, tip)?;
    } else {
        validate_chain(std::slice::from_ref(&candidate))?;
    }
    chain.push(candidate);
    Ok(())
}

/// Reconciles `chain` with blocks received from a peer.
///
/// `received` is ordered by index with a stable sort, so blocks sharing an
/// index keep their arrival order.
pub fn resolve(chain: &mut Vec<Block>, mut received: Vec<Block>) -> Resolution {
    received.sort_by_key(|block| block.index);

    let (Some(latest_received), Some(latest_held)) = (received.last(), chain.last()) else {
        debug!("Empty chain data received, nothing to compare");
        return Resolution::Ignored;
    };

    if latest_received.index <= latest_held.index {
        debug!(
            held = latest_held.index,
            received = latest_received.index,
            "Received chain is not longer than held chain, doing nothing"
        );
        return Resolution::Ignored;
    }

    info!(
        held = latest_held.index,
        received = latest_received.index,
        "Chain possibly behind"
    );

    if latest_held.hash == latest_received.previous_hash {
        let Some(tip) = received.pop() else {
            return Resolution::Ignored;
        };
        let index = tip.index;
        return match append_if_valid(chain, tip) {
            Ok(()) => {
                info!(index, "Appended received block to local chain");
                Resolution::Extended
            }
            Err(e) => {
                warn!(index, error = %e, "Received block links to tip but is invalid");
                Resolution::Rejected
            }
        };
    }

    if received.len() == 1 {
        info!("Single non-linking tip received, querying full chain");
        return Resolution::RequestFull;
    }

    if received.len() <= chain.len() {
        warn!(
            held_len = chain.len(),
            received_len = received.len(),
            "Received chain is not strictly longer, rejecting"
        );
        return Resolution::Rejected;
    }

    match validate_chain(&received) {
        Ok(()) => {
            info!(
                old_len = chain.len(),
                new_len = received.len(),
                "Received chain is valid, replacing local chain"
            );
            *chain = received;
            Resolution::Replaced
        }
        Err(e) => {
            warn!(error = %e, "Received chain is invalid");
            Resolution::Rejected
        }
    }
}
