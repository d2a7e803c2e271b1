//! Module events
//!
//! Events are immutable records returned by successful handlers, one per
//! accepted message. They describe the transition that was applied.

use serde::{Deserialize, Serialize};
use types::ids::{Address, EscrowId, Hash};
use types::numeric::{Amount, BlockHeight, Coin};

use crate::utxo::types::OutPoint;

/// Balance-ledger funds converted into a spendable account output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputBorn {
    pub id: Hash,
    pub owner: Address,
    pub value: Amount,
    pub block: BlockHeight,
}

/// A transfer transaction accepted into the UTXO ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionApplied {
    pub tx_hash: Hash,
    pub spent: OutPoint,
    pub created: Vec<OutPoint>,
    pub value: Amount,
}

/// HTLC funded by the timeout party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcCreated {
    pub hash: Hash,
    pub amount: Coin,
    pub redeem_address: Address,
    pub timeout_address: Address,
    pub expires_at: BlockHeight,
}

/// HTLC released to the redeem party on preimage reveal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcRedeemed {
    pub hash: Hash,
    pub preimage: Vec<u8>,
    pub redeem_address: Address,
    pub amount: Coin,
}

/// HTLC refunded to the timeout party after expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtlcFailed {
    pub hash: Hash,
    pub timeout_address: Address,
    pub amount: Coin,
}

/// Escrow created and funded by party A
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowCreated {
    pub id: EscrowId,
    pub party_a_address: Address,
    pub party_b_address: Address,
    pub balance: Coin,
}

/// Escrow aborted before party B joined; funds returned to party A
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAborted {
    pub id: EscrowId,
    pub refunded: Coin,
}

/// Party B funded the escrow; it is now locked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowJoined {
    pub id: EscrowId,
    pub balance: Coin,
}

/// Co-signed disbursement from a locked escrow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowSpent {
    pub id: EscrowId,
    pub to_address: Address,
    pub amount: Coin,
    pub remaining: Coin,
}

/// Enum wrapper for all module events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    OutputBorn(OutputBorn),
    TransactionApplied(TransactionApplied),
    HtlcCreated(HtlcCreated),
    HtlcRedeemed(HtlcRedeemed),
    HtlcFailed(HtlcFailed),
    EscrowCreated(EscrowCreated),
    EscrowAborted(EscrowAborted),
    EscrowJoined(EscrowJoined),
    EscrowSpent(EscrowSpent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_born_serialization() {
        let event = OutputBorn {
            id: Hash::new([3u8; 32]),
            owner: Address::new("alice"),
            value: 100,
            block: 7,
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: OutputBorn = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_contract_event_enum_variant() {
        let event = ContractEvent::EscrowAborted(EscrowAborted {
            id: EscrowId::new("x"),
            refunded: Coin::new("stake", 30),
        });
        assert!(matches!(event, ContractEvent::EscrowAborted(_)));
    }

    #[test]
    fn test_transaction_applied_serialization() {
        let event = ContractEvent::TransactionApplied(TransactionApplied {
            tx_hash: Hash::new([1u8; 32]),
            spent: OutPoint::account_birth(Hash::new([2u8; 32])),
            created: vec![OutPoint::new(Hash::new([1u8; 32]), 0)],
            value: 100,
        });
        let json = serde_json::to_string(&event).unwrap();
        let deser: ContractEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }
}
