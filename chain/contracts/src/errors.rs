//! Module error types
//!
//! Every variant except `StateError::Corrupt` is a rejection: the message is
//! refused, no state changed, and the originator may fix and resubmit. A
//! corrupt record means the replicated state itself is damaged and the host
//! must halt.

use thiserror::Error;
use types::ids::{EscrowId, Hash};

/// Balance-ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BankError {
    #[error("Insufficient funds for {address}: required {required}, available {available}")]
    InsufficientFunds {
        address: String,
        required: String,
        available: String,
    },

    #[error("Arithmetic overflow crediting {address}")]
    Overflow { address: String },
}

/// State accessor errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("Corrupt state record at {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// UTXO ledger rejections
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UtxoError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Unsupported input count: {count} (exactly one input is supported)")]
    UnsupportedInputCount { count: usize },

    #[error("Transaction inputs or outputs are not in canonical order")]
    NonCanonicalOrder,

    #[error("OutPoint not found or already spent: {outpoint}")]
    OutPointNotFound { outpoint: String },

    /// `outputs` is `None` when the output sum overflows.
    #[error(
        "Value conservation violated: inputs {inputs}, outputs {}",
        .outputs.map_or_else(|| "overflow".to_string(), |v| v.to_string())
    )]
    ValueConservationViolation { inputs: u64, outputs: Option<u64> },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Denomination mismatch: expected {expected}, got {actual}")]
    DenomMismatch { expected: String, actual: String },

    #[error("Account output already exists: {0}")]
    DuplicateId(Hash),

    #[error("Transaction not found: {0}")]
    NotFound(Hash),

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// HTLC engine rejections
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HtlcError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("HTLC with hash {0} already exists")]
    DuplicateHash(Hash),

    #[error("HTLC not found: {0}")]
    NotFound(Hash),

    #[error("HTLC {hash} already resolved: {status}")]
    AlreadyResolved { hash: Hash, status: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("HTLC expired at block {expires_at}, current block {current}")]
    Expired { expires_at: i64, current: i64 },

    #[error("HTLC not expired until block {expires_at}, current block {current}")]
    NotYetExpired { expires_at: i64, current: i64 },

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Escrow engine rejections
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EscrowError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Escrow contract {0} already exists")]
    DuplicateId(EscrowId),

    #[error("Party addresses must differ")]
    SamePartyAddresses,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Denomination mismatch: {left} vs {right}")]
    DenomMismatch { left: String, right: String },

    #[error("Escrow contract not found: {0}")]
    NotFound(EscrowId),

    #[error("Escrow contract {0} already joined")]
    AlreadyJoined(EscrowId),

    #[error("Escrow contract {0} is not locked")]
    NotReady(EscrowId),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Amount mismatch: expected {expected}, got {actual}")]
    AmountMismatch { expected: String, actual: String },

    #[error("Insufficient escrow balance: requested {requested}, available {available}")]
    InsufficientEscrowBalance { requested: String, available: String },

    #[error("Arithmetic overflow in escrow balance")]
    Overflow,

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Top-level error returned by the dispatcher.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractError {
    #[error("UTXO: {0}")]
    Utxo(#[from] UtxoError),

    #[error("HTLC: {0}")]
    Htlc(#[from] HtlcError),

    #[error("Escrow: {0}")]
    Escrow(#[from] EscrowError),

    #[error("Unknown operation: {module}/{operation}")]
    UnknownOperation { module: String, operation: String },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl ContractError {
    /// True when the error signals corrupt replicated state rather than a
    /// rejected message.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ContractError::Utxo(UtxoError::State(_))
                | ContractError::Htlc(HtlcError::State(_))
                | ContractError::Escrow(EscrowError::State(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_error_display() {
        let err = BankError::InsufficientFunds {
            address: "alice".to_string(),
            required: "100stake".to_string(),
            available: "5stake".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds for alice: required 100stake, available 5stake"
        );
    }

    #[test]
    fn test_htlc_error_display() {
        let err = HtlcError::Expired {
            expires_at: 110,
            current: 110,
        };
        assert!(err.to_string().contains("110"));
    }

    #[test]
    fn test_value_conservation_display() {
        let short = UtxoError::ValueConservationViolation {
            inputs: 100,
            outputs: Some(90),
        };
        assert_eq!(
            short.to_string(),
            "Value conservation violated: inputs 100, outputs 90"
        );

        let wrapped = UtxoError::ValueConservationViolation {
            inputs: 100,
            outputs: None,
        };
        assert!(wrapped.to_string().ends_with("outputs overflow"));
    }

    #[test]
    fn test_utxo_error_from_bank() {
        let bank_err = BankError::Overflow {
            address: "bob".to_string(),
        };
        let utxo_err: UtxoError = bank_err.into();
        assert!(matches!(utxo_err, UtxoError::Bank(_)));
    }

    #[test]
    fn test_only_corrupt_state_is_fatal() {
        let corrupt = StateError::Corrupt {
            key: "htlc/ab".to_string(),
            reason: "eof".to_string(),
        };
        let fatal: ContractError = HtlcError::State(corrupt).into();
        assert!(fatal.is_fatal());

        let rejection: ContractError = EscrowError::SamePartyAddresses.into();
        assert!(!rejection.is_fatal());

        let unknown = ContractError::UnknownOperation {
            module: "bank".to_string(),
            operation: "send".to_string(),
        };
        assert!(!unknown.is_fatal());
    }
}
