//! Error types for parsing and arithmetic on shared types

use thiserror::Error;

/// Errors produced by the shared value types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid coin: {0}")]
    InvalidCoin(String),

    #[error("Denomination mismatch: {left} vs {right}")]
    DenomMismatch { left: String, right: String },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_length_display() {
        let err = TypeError::InvalidLength {
            expected: 32,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Invalid length: expected 32 bytes, got 3");
    }

    #[test]
    fn test_denom_mismatch_display() {
        let err = TypeError::DenomMismatch {
            left: "stake".to_string(),
            right: "atom".to_string(),
        };
        assert!(err.to_string().contains("atom"));
    }
}
