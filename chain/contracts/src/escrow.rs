//! Two-party multisig escrow
//!
//! Lifecycle:
//! 1. `Init` by party A funds the contract with A's share (`Created`)
//! 2. `Abort` by party A before B joins refunds A and removes the record
//! 3. `Join` by party B funds B's exact share (`Locked`)
//! 4. `Spend`, co-signed by both parties, disburses from the balance while
//!    `Locked`; a drained contract stays `Locked`

use serde::{Deserialize, Serialize};
use tracing::debug;
use types::ids::{Address, EscrowId};
use types::numeric::Coin;

use crate::context::HandlerContext;
use crate::errors::EscrowError;
use crate::events::{ContractEvent, EscrowAborted, EscrowCreated, EscrowJoined, EscrowSpent};
use crate::store::{load_record, put_record, ReadState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowState {
    Created,
    Locked,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowContract {
    pub id: EscrowId,
    pub state: EscrowState,
    pub party_a_amount: Coin,
    pub party_a_address: Address,
    pub party_b_amount: Coin,
    pub party_b_address: Address,
    pub balance: Coin,
}

// ───────────────────────── Messages ─────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitEscrow {
    pub id: EscrowId,
    pub party_a_amount: Coin,
    pub party_a_address: Address,
    pub party_b_amount: Coin,
    pub party_b_address: Address,
}

impl InitEscrow {
    pub fn validate_basic(&self) -> Result<(), EscrowError> {
        if self.id.is_empty() {
            return Err(EscrowError::InvalidMessage("escrow id is empty".to_string()));
        }
        if self.party_a_address.is_empty() || self.party_b_address.is_empty() {
            return Err(EscrowError::InvalidMessage("party address is empty".to_string()));
        }
        Ok(())
    }

    pub fn signers(&self) -> Vec<Address> {
        vec![self.party_a_address.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortEscrow {
    pub id: EscrowId,
    pub caller: Address,
}

impl AbortEscrow {
    pub fn validate_basic(&self) -> Result<(), EscrowError> {
        if self.id.is_empty() || self.caller.is_empty() {
            return Err(EscrowError::InvalidMessage(
                "escrow id and caller are required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn signers(&self) -> Vec<Address> {
        vec![self.caller.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinEscrow {
    pub id: EscrowId,
    pub caller: Address,
    pub amount: Coin,
}

impl JoinEscrow {
    pub fn validate_basic(&self) -> Result<(), EscrowError> {
        if self.id.is_empty() || self.caller.is_empty() {
            return Err(EscrowError::InvalidMessage(
                "escrow id and caller are required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn signers(&self) -> Vec<Address> {
        vec![self.caller.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendEscrow {
    pub id: EscrowId,
    pub amount: Coin,
    pub to_address: Address,
    pub caller_a: Address,
    pub caller_b: Address,
}

impl SpendEscrow {
    pub fn validate_basic(&self) -> Result<(), EscrowError> {
        if self.id.is_empty() {
            return Err(EscrowError::InvalidMessage("escrow id is empty".to_string()));
        }
        if !self.amount.is_positive() {
            return Err(EscrowError::InvalidAmount(format!(
                "spend amount must be positive, got {}",
                self.amount
            )));
        }
        if self.to_address.is_empty() || self.caller_a.is_empty() || self.caller_b.is_empty() {
            return Err(EscrowError::InvalidMessage("address is empty".to_string()));
        }
        Ok(())
    }

    /// Both parties co-sign.
    pub fn signers(&self) -> Vec<Address> {
        vec![self.caller_a.clone(), self.caller_b.clone()]
    }
}

fn escrow_key(id: &EscrowId) -> Vec<u8> {
    id.as_str().as_bytes().to_vec()
}

/// Look up a live escrow contract. Aborted contracts are removed.
pub fn get_escrow<S: ReadState + ?Sized>(
    state: &S,
    id: &EscrowId,
) -> Result<EscrowContract, EscrowError> {
    load_record(state, &escrow_key(id))?.ok_or_else(|| EscrowError::NotFound(id.clone()))
}

// ───────────────────────── Engine ─────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct EscrowEngine;

impl EscrowEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn init(
        &self,
        ctx: HandlerContext<'_>,
        msg: &InitEscrow,
    ) -> Result<ContractEvent, EscrowError> {
        let HandlerContext { state, bank, .. } = ctx;
        msg.validate_basic()?;

        let key = escrow_key(&msg.id);
        if state.has(&key) {
            return Err(EscrowError::DuplicateId(msg.id.clone()));
        }
        if msg.party_a_address == msg.party_b_address {
            return Err(EscrowError::SamePartyAddresses);
        }
        for share in [&msg.party_a_amount, &msg.party_b_amount] {
            if !share.is_positive() {
                return Err(EscrowError::InvalidAmount(format!(
                    "party amounts must be positive, got {}",
                    share
                )));
            }
        }
        if !msg.party_a_amount.same_denom_as(&msg.party_b_amount) {
            return Err(EscrowError::DenomMismatch {
                left: msg.party_a_amount.denom.clone(),
                right: msg.party_b_amount.denom.clone(),
            });
        }

        bank.debit(&msg.party_a_address, &msg.party_a_amount)?;

        let contract = EscrowContract {
            id: msg.id.clone(),
            state: EscrowState::Created,
            party_a_amount: msg.party_a_amount.clone(),
            party_a_address: msg.party_a_address.clone(),
            party_b_amount: msg.party_b_amount.clone(),
            party_b_address: msg.party_b_address.clone(),
            balance: msg.party_a_amount.clone(),
        };
        put_record(state, &key, &contract);

        debug!(id = %contract.id, balance = %contract.balance, "escrow created");
        Ok(ContractEvent::EscrowCreated(EscrowCreated {
            id: contract.id,
            party_a_address: contract.party_a_address,
            party_b_address: contract.party_b_address,
            balance: contract.balance,
        }))
    }

    pub fn abort(
        &self,
        ctx: HandlerContext<'_>,
        msg: &AbortEscrow,
    ) -> Result<ContractEvent, EscrowError> {
        let HandlerContext { state, bank, .. } = ctx;
        msg.validate_basic()?;

        let contract = get_escrow(&*state, &msg.id)?;
        if contract.state != EscrowState::Created {
            return Err(EscrowError::AlreadyJoined(msg.id.clone()));
        }
        if msg.caller != contract.party_a_address {
            return Err(EscrowError::Unauthorized(format!(
                "only party A may abort {}",
                msg.id
            )));
        }

        bank.credit(&contract.party_a_address, &contract.balance)?;
        state.delete(&escrow_key(&msg.id));

        debug!(id = %msg.id, refunded = %contract.balance, "escrow aborted");
        Ok(ContractEvent::EscrowAborted(EscrowAborted {
            id: contract.id,
            refunded: contract.balance,
        }))
    }

    pub fn join(
        &self,
        ctx: HandlerContext<'_>,
        msg: &JoinEscrow,
    ) -> Result<ContractEvent, EscrowError> {
        let HandlerContext { state, bank, .. } = ctx;
        msg.validate_basic()?;

        let mut contract = get_escrow(&*state, &msg.id)?;
        if contract.state != EscrowState::Created {
            return Err(EscrowError::AlreadyJoined(msg.id.clone()));
        }
        if msg.caller != contract.party_b_address {
            return Err(EscrowError::Unauthorized(format!(
                "only party B may join {}",
                msg.id
            )));
        }
        if msg.amount != contract.party_b_amount {
            return Err(EscrowError::AmountMismatch {
                expected: contract.party_b_amount.to_string(),
                actual: msg.amount.to_string(),
            });
        }
        let balance = contract
            .balance
            .checked_add(&msg.amount)
            .map_err(|_| EscrowError::Overflow)?;

        bank.debit(&contract.party_b_address, &msg.amount)?;

        contract.balance = balance;
        contract.state = EscrowState::Locked;
        put_record(state, &escrow_key(&msg.id), &contract);

        debug!(id = %msg.id, balance = %contract.balance, "escrow joined");
        Ok(ContractEvent::EscrowJoined(EscrowJoined {
            id: contract.id,
            balance: contract.balance,
        }))
    }

    pub fn spend(
        &self,
        ctx: HandlerContext<'_>,
        msg: &SpendEscrow,
    ) -> Result<ContractEvent, EscrowError> {
        let HandlerContext { state, bank, .. } = ctx;
        msg.validate_basic()?;

        let mut contract = get_escrow(&*state, &msg.id)?;
        if contract.state != EscrowState::Locked {
            return Err(EscrowError::NotReady(msg.id.clone()));
        }
        if msg.caller_a != contract.party_a_address || msg.caller_b != contract.party_b_address {
            return Err(EscrowError::Unauthorized(format!(
                "spend from {} requires both parties",
                msg.id
            )));
        }
        if !msg.amount.same_denom_as(&contract.balance) {
            return Err(EscrowError::DenomMismatch {
                left: contract.balance.denom.clone(),
                right: msg.amount.denom.clone(),
            });
        }
        let remaining = contract.balance.checked_sub(&msg.amount).map_err(|_| {
            EscrowError::InsufficientEscrowBalance {
                requested: msg.amount.to_string(),
                available: contract.balance.to_string(),
            }
        })?;

        bank.credit(&msg.to_address, &msg.amount)?;

        contract.balance = remaining;
        put_record(state, &escrow_key(&msg.id), &contract);

        debug!(id = %msg.id, to = %msg.to_address, amount = %msg.amount, "escrow spent");
        Ok(ContractEvent::EscrowSpent(EscrowSpent {
            id: contract.id,
            to_address: msg.to_address.clone(),
            amount: msg.amount.clone(),
            remaining: contract.balance,
        }))
    }
}
