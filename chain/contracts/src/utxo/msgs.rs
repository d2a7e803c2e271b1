//! UTXO ledger messages

use serde::{Deserialize, Serialize};
use types::ids::Address;
use types::numeric::Coin;

use super::types::{SpendCondition, Transaction};
use crate::errors::UtxoError;

/// Convert `amount` of `owner`'s balance into a spendable account output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthOutput {
    pub amount: Coin,
    pub owner: Address,
}

impl BirthOutput {
    pub fn new(amount: Coin, owner: Address) -> Self {
        Self { amount, owner }
    }

    pub fn validate_basic(&self) -> Result<(), UtxoError> {
        if !self.amount.is_positive() {
            return Err(UtxoError::InvalidMessage(format!(
                "birth amount must be positive, got {}",
                self.amount
            )));
        }
        if self.owner.is_empty() {
            return Err(UtxoError::InvalidMessage("owner address is empty".to_string()));
        }
        Ok(())
    }

    pub fn signers(&self) -> Vec<Address> {
        vec![self.owner.clone()]
    }
}

/// Apply a transfer transaction authorized by `signer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendTx {
    pub tx: Transaction,
    pub signer: Address,
}

impl SpendTx {
    pub fn new(tx: Transaction, signer: Address) -> Self {
        Self { tx, signer }
    }

    pub fn validate_basic(&self) -> Result<(), UtxoError> {
        if self.tx.inputs.is_empty() {
            return Err(UtxoError::InvalidMessage("transaction has no inputs".to_string()));
        }
        if self.tx.outputs.is_empty() {
            return Err(UtxoError::InvalidMessage("transaction has no outputs".to_string()));
        }
        if self.signer.is_empty() {
            return Err(UtxoError::InvalidMessage("signer address is empty".to_string()));
        }
        for (index, out) in self.tx.outputs.iter().enumerate() {
            SpendCondition::decode(&out.spend_condition).map_err(|reason| {
                UtxoError::InvalidMessage(format!("output {}: {}", index, reason))
            })?;
        }
        Ok(())
    }

    pub fn signers(&self) -> Vec<Address> {
        vec![self.signer.clone()]
    }
}
