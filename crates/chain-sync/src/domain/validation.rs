//! # Block and Chain Validation
//!
//! The acceptance gate for every block that enters a local chain.
//!
//! ## Rules
//!
//! A candidate is a valid successor of `previous` iff:
//! 1. `candidate.index == previous.index + 1`
//! 2. `candidate.previous_hash == previous.hash`
//! 3. `candidate` is well-formed (stored hash matches recomputed hash)
//!
//! No other field is checked. A chain is valid iff it is non-empty, starts
//! with the genesis block and every adjacent pair passes the rules above.

use super::{genesis_block, Block, ValidationError, ValidationResult};

/// Checks `candidate` against `previous`, reporting the first failed rule.
pub fn validate_successor(candidate: &Block, previous: &Block) -> ValidationResult<()> {
    let expected = previous.index + 1;
    if candidate.index != expected {
        return Err(ValidationError::InvalidIndex {
            expected,
            actual: candidate.index,
        });
    }

    if candidate.previous_hash != previous.hash {
        return Err(ValidationError::InvalidPreviousHash {
            index: candidate.index,
            expected: previous.hash.clone(),
            actual: candidate.previous_hash.clone(),
        });
    }

    let computed = candidate.computed_hash();
    if computed != candidate.hash {
        return Err(ValidationError::InvalidHash {
            index: candidate.index,
            computed,
            stored: candidate.hash.clone(),
        });
    }

    Ok(())
}

/// Boolean form of [`validate_successor`].
pub fn is_valid_successor(candidate: &Block, previous: &Block) -> bool {
    validate_successor(candidate, previous).is_ok()
}

/// Walks `chain` once from the genesis block, stopping at the first failure.
pub fn validate_chain(chain: &[Block]) -> ValidationResult<()> {
    let first = chain.first().ok_or(ValidationError::EmptyChain)?;
    if *first != genesis_block() {
        return Err(ValidationError::GenesisMismatch);
    }

    chain
        .windows(2)
        .try_for_each(|pair| validate_successor(&pair[1], &pair[0]))
}

/// Boolean form of [`validate_chain`].
pub fn is_valid_chain(chain: &[Block]) -> bool {
    validate_chain(chain).is_ok()
}
