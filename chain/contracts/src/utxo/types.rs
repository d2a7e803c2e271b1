//! UTXO ledger records

use serde::{Deserialize, Serialize};
use std::fmt;
use types::ids::{Address, Hash};
use types::numeric::{Amount, BlockHeight};

/// `OutPoint::index` sentinel: `source_id` names an account output.
pub const ACCOUNT_BIRTH_INDEX: i32 = -1;

/// Reference to a spendable output.
///
/// `index >= 0` is output #index of transaction `source_id`;
/// `index == -1` is the account output identified by `source_id`.
/// Derived ordering is (source_id bytes, index), the canonical input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub source_id: Hash,
    pub index: i32,
}

impl OutPoint {
    pub const fn new(source_id: Hash, index: i32) -> Self {
        Self { source_id, index }
    }

    pub const fn account_birth(id: Hash) -> Self {
        Self {
            source_id: id,
            index: ACCOUNT_BIRTH_INDEX,
        }
    }

    pub fn is_account_birth(&self) -> bool {
        self.index == ACCOUNT_BIRTH_INDEX
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_id, self.index)
    }
}

/// Value converted out of the balance ledger into a spendable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOutput {
    pub id: Hash,
    pub value: Amount,
    pub owner: Address,
    pub created_at_block: BlockHeight,
}

/// Spend-condition tag bytes. New variants take new tags; existing encodings
/// never change.
const TAG_PAY_TO_ADDRESS: u8 = 0x01;

/// Who may spend an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendCondition {
    PayToAddress { address: Address },
}

impl SpendCondition {
    /// Tag byte followed by the variant payload.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            SpendCondition::PayToAddress { address } => {
                let mut out = Vec::with_capacity(1 + address.as_bytes().len());
                out.push(TAG_PAY_TO_ADDRESS);
                out.extend_from_slice(address.as_bytes());
                out
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let (tag, payload) = bytes
            .split_first()
            .ok_or_else(|| "empty spend condition".to_string())?;
        match *tag {
            TAG_PAY_TO_ADDRESS => {
                let address = std::str::from_utf8(payload)
                    .map_err(|_| "pay-to-address payload is not UTF-8".to_string())?;
                if address.is_empty() {
                    return Err("pay-to-address with empty address".to_string());
                }
                Ok(SpendCondition::PayToAddress {
                    address: Address::new(address),
                })
            }
            other => Err(format!("unknown spend condition tag {:#04x}", other)),
        }
    }

    /// The single address authorized to spend, for variants that have one.
    pub fn authorized_address(&self) -> &Address {
        match self {
            SpendCondition::PayToAddress { address } => address,
        }
    }
}

/// Transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    pub spend_condition: Vec<u8>,
}

impl TxOut {
    pub fn pay_to_address(value: Amount, address: &Address) -> Self {
        Self {
            value,
            spend_condition: SpendCondition::PayToAddress {
                address: address.clone(),
            }
            .encode(),
        }
    }
}

/// Transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub input: OutPoint,
    #[serde(default)]
    pub witness: Vec<u8>,
    #[serde(default)]
    pub sequence: u32,
}

impl TxIn {
    pub fn new(input: OutPoint) -> Self {
        Self {
            input,
            witness: Vec::new(),
            sequence: 0,
        }
    }
}

/// A transfer transaction. Stored under its canonical hash once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    #[serde(default)]
    pub lock_time: u32,
}

impl Transaction {
    /// Checked sum of output values, `None` on overflow.
    pub fn output_value(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.value))
    }
}

/// An unspent outpoint and its value, one line of a wallet view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutPointValue {
    pub source_id: Hash,
    pub index: i32,
    pub value: Amount,
}

/// Balance of an address and the outpoints that make it up.
///
/// The total is widened to `u128`: each entry fits in `u64` but their sum
/// need not.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wallet {
    pub balance: u128,
    pub entries: Vec<OutPointValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outpoint_ordering() {
        let low = Hash::new([1u8; 32]);
        let high = Hash::new([2u8; 32]);
        assert!(OutPoint::new(low, 5) < OutPoint::new(high, 0));
        assert!(OutPoint::account_birth(low) < OutPoint::new(low, 0));
    }

    #[test]
    fn test_outpoint_display() {
        let op = OutPoint::account_birth(Hash::new([0xab; 32]));
        assert!(op.to_string().ends_with(":-1"));
        assert!(op.is_account_birth());
    }

    #[test]
    fn test_spend_condition_encoding() {
        let cond = SpendCondition::PayToAddress {
            address: Address::new("bob"),
        };
        let bytes = cond.encode();
        assert_eq!(bytes, vec![0x01, b'b', b'o', b'b']);
        assert_eq!(SpendCondition::decode(&bytes).unwrap(), cond);
        assert_eq!(cond.authorized_address(), &Address::new("bob"));
    }

    #[test]
    fn test_spend_condition_rejects_unknown_and_empty() {
        assert!(SpendCondition::decode(&[]).is_err());
        assert!(SpendCondition::decode(&[0x01]).is_err());
        let err = SpendCondition::decode(&[0x02, 0xff]).unwrap_err();
        assert!(err.contains("0x02"));
    }

    #[test]
    fn test_output_value_overflow() {
        let tx = Transaction {
            inputs: vec![],
            outputs: vec![
                TxOut::pay_to_address(u64::MAX, &Address::new("a")),
                TxOut::pay_to_address(1, &Address::new("b")),
            ],
            lock_time: 0,
        };
        assert_eq!(tx.output_value(), None);
    }
}
