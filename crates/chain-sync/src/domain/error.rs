//! Error types for block and chain validation

/// Reason a block or chain was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid block index: expected {expected}, got {actual}")]
    InvalidIndex { expected: u64, actual: u64 },

    #[error("Invalid previous hash at index {index}: expected {expected}, got {actual}")]
    InvalidPreviousHash {
        index: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid hash at index {index}: computed {computed}, stored {stored}")]
    InvalidHash {
        index: u64,
        computed: String,
        stored: String,
    },

    #[error("Chain is empty")]
    EmptyChain,

    #[error("First block does not match the genesis block")]
    GenesisMismatch,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
