//! Balance ledger: the account-balance collaborator that funds and refunds
//! contracts
//!
//! The modules only ever debit (lock funds into a UTXO, HTLC or escrow) and
//! credit (release them). `MemoryBank` is the reference implementation:
//! - Balances tracked by (address, denom)
//! - Checked arithmetic on both debit and credit
//! - Auth-layer account sequence numbers consumed by account-output ids

use std::collections::BTreeMap;
use types::ids::Address;
use types::numeric::{Amount, Coin};

use crate::errors::BankError;

/// Atomic debit/credit of fungible balances.
pub trait BalanceLedger {
    /// Remove `coin` from `address`, or fail without effect.
    fn debit(&mut self, address: &Address, coin: &Coin) -> Result<(), BankError>;

    /// Add `coin` to `address`.
    fn credit(&mut self, address: &Address, coin: &Coin) -> Result<(), BankError>;

    /// Current balance of `address` in `denom`.
    fn balance(&self, address: &Address, denom: &str) -> Amount;
}

/// Per-account sequence numbers maintained by the authentication layer.
pub trait AccountSequence {
    fn sequence(&self, address: &Address) -> u64;
}

/// Everything a handler needs from the account layer.
pub trait Accounts: BalanceLedger + AccountSequence {}

impl<T: BalanceLedger + AccountSequence> Accounts for T {}

/// In-memory balance ledger.
///
/// Balances are stored as `BTreeMap<Address, BTreeMap<String, Amount>>` where
/// the inner map keys are denominations (e.g. "stake").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBank {
    /// Balances: address -> (denom -> amount)
    balances: BTreeMap<Address, BTreeMap<String, Amount>>,
    /// Sequences: address -> next sequence
    sequences: BTreeMap<Address, u64>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    // ───────────────────────── Setup ─────────────────────────

    /// Mint `coin` into `address`. Genesis / test funding only.
    pub fn fund(&mut self, address: &Address, coin: &Coin) -> Result<(), BankError> {
        self.safe_credit(address, coin)
    }

    /// Advance the auth-layer sequence for `address`, as the host does after
    /// each delivered transaction.
    pub fn increment_sequence(&mut self, address: &Address) {
        *self.sequences.entry(address.clone()).or_insert(0) += 1;
    }

    /// Get all balances for an address.
    pub fn account_balances(&self, address: &Address) -> Option<&BTreeMap<String, Amount>> {
        self.balances.get(address)
    }

    // ───────────────────────── Safe Transfer ─────────────────────────

    fn safe_credit(&mut self, address: &Address, coin: &Coin) -> Result<(), BankError> {
        let current = self
            .balances
            .get(address)
            .and_then(|denoms| denoms.get(&coin.denom))
            .copied()
            .unwrap_or(0);

        let new_balance = current
            .checked_add(coin.amount)
            .ok_or_else(|| BankError::Overflow {
                address: address.to_string(),
            })?;

        self.balances
            .entry(address.clone())
            .or_default()
            .insert(coin.denom.clone(), new_balance);
        Ok(())
    }

    fn safe_debit(&mut self, address: &Address, coin: &Coin) -> Result<(), BankError> {
        let available = self.balance(address, &coin.denom);
        if available < coin.amount {
            return Err(BankError::InsufficientFunds {
                address: address.to_string(),
                required: coin.to_string(),
                available: Coin::new(coin.denom.clone(), available).to_string(),
            });
        }

        if let Some(denoms) = self.balances.get_mut(address) {
            denoms.insert(coin.denom.clone(), available - coin.amount);
        }
        Ok(())
    }
}

impl BalanceLedger for MemoryBank {
    fn debit(&mut self, address: &Address, coin: &Coin) -> Result<(), BankError> {
        self.safe_debit(address, coin)
    }

    fn credit(&mut self, address: &Address, coin: &Coin) -> Result<(), BankError> {
        self.safe_credit(address, coin)
    }

    fn balance(&self, address: &Address, denom: &str) -> Amount {
        self.balances
            .get(address)
            .and_then(|denoms| denoms.get(denom))
            .copied()
            .unwrap_or(0)
    }
}

impl AccountSequence for MemoryBank {
    fn sequence(&self, address: &Address) -> u64 {
        self.sequences.get(address).copied().unwrap_or(0)
    }
}
