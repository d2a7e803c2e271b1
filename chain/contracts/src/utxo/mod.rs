//! UTXO ledger: account-output births and single-input transfers
//!
//! Namespace layout (inside the module's prefixed store):
//! - `acc/<id>`: `AccountOutput`, never deleted
//! - `utxo/<source_id>:<index>`: live `OutPoint`, deleted when spent
//! - `tx/<hash>`: accepted `Transaction`, never deleted
//!
//! An outpoint exists in `utxo/` exactly while it is unspent.

pub mod canonical;
pub mod msgs;
pub mod query;
pub mod types;

use ::types::ids::{Address, Hash};
use ::types::numeric::Amount;
use tracing::debug;

use self::canonical::{account_output_id, is_canonical, tx_hash};
use self::msgs::{BirthOutput, SpendTx};
use self::types::{AccountOutput, OutPoint, SpendCondition, Transaction, TxIn};
use crate::config::{ModuleConfig, WitnessPolicy};
use crate::context::HandlerContext;
use crate::errors::{StateError, UtxoError};
use crate::events::{ContractEvent, OutputBorn, TransactionApplied};
use crate::security::{Ed25519Verifier, SignatureVerifier, Witness};
use crate::store::{load_record, put_record, ReadState};

pub(crate) const ACC_PREFIX: &str = "acc/";
pub(crate) const OUTPOINT_PREFIX: &str = "utxo/";
pub(crate) const TX_PREFIX: &str = "tx/";

pub(crate) fn acc_key(id: &Hash) -> Vec<u8> {
    format!("{}{}", ACC_PREFIX, id).into_bytes()
}

pub(crate) fn outpoint_key(outpoint: &OutPoint) -> Vec<u8> {
    format!("{}{}", OUTPOINT_PREFIX, outpoint).into_bytes()
}

pub(crate) fn tx_key(hash: &Hash) -> Vec<u8> {
    format!("{}{}", TX_PREFIX, hash).into_bytes()
}

fn missing_record(key: &[u8], what: &str) -> StateError {
    StateError::Corrupt {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: format!("live outpoint references missing {}", what),
    }
}

/// Value and authorized spender of a live outpoint.
///
/// The outpoint itself is assumed live; a missing backing record is corrupt
/// state, not a rejection.
pub(crate) fn resolve_outpoint<S: ReadState + ?Sized>(
    state: &S,
    outpoint: &OutPoint,
) -> Result<(Amount, Address), StateError> {
    if outpoint.is_account_birth() {
        let key = acc_key(&outpoint.source_id);
        let output: AccountOutput =
            load_record(state, &key)?.ok_or_else(|| missing_record(&key, "account output"))?;
        return Ok((output.value, output.owner));
    }

    let key = tx_key(&outpoint.source_id);
    let tx: Transaction =
        load_record(state, &key)?.ok_or_else(|| missing_record(&key, "transaction"))?;
    let out = usize::try_from(outpoint.index)
        .ok()
        .and_then(|i| tx.outputs.get(i))
        .ok_or_else(|| missing_record(&key, "output index"))?;
    let condition =
        SpendCondition::decode(&out.spend_condition).map_err(|reason| StateError::Corrupt {
            key: String::from_utf8_lossy(&key).into_owned(),
            reason,
        })?;
    Ok((out.value, condition.authorized_address().clone()))
}

/// UTXO ledger handlers.
pub struct UtxoLedger {
    config: ModuleConfig,
    verifier: Box<dyn SignatureVerifier>,
}

impl UtxoLedger {
    pub fn new(config: ModuleConfig) -> Self {
        Self {
            config,
            verifier: Box::new(Ed25519Verifier),
        }
    }

    pub fn with_verifier(mut self, verifier: Box<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    // ───────────────────────── Birth ─────────────────────────

    /// Debit `msg.amount` from the owner and create an account output.
    pub fn birth_output(
        &self,
        ctx: HandlerContext<'_>,
        msg: &BirthOutput,
    ) -> Result<ContractEvent, UtxoError> {
        let HandlerContext { block, state, bank } = ctx;
        msg.validate_basic()?;
        if msg.amount.denom != self.config.native_denom {
            return Err(UtxoError::DenomMismatch {
                expected: self.config.native_denom.clone(),
                actual: msg.amount.denom.clone(),
            });
        }

        let sequence = bank.sequence(&msg.owner);
        let id = account_output_id(
            block.chain_id(),
            &msg.owner,
            &msg.amount,
            sequence,
            block.current_block_height(),
        );
        let key = acc_key(&id);
        if state.has(&key) {
            return Err(UtxoError::DuplicateId(id));
        }

        bank.debit(&msg.owner, &msg.amount)?;

        let output = AccountOutput {
            id,
            value: msg.amount.amount,
            owner: msg.owner.clone(),
            created_at_block: block.current_block_height(),
        };
        let outpoint = OutPoint::account_birth(id);
        put_record(state, &key, &output);
        put_record(state, &outpoint_key(&outpoint), &outpoint);

        debug!(%id, owner = %msg.owner, value = output.value, "account output born");
        Ok(ContractEvent::OutputBorn(OutputBorn {
            id,
            owner: output.owner,
            value: output.value,
            block: output.created_at_block,
        }))
    }

    // ───────────────────────── Spend ─────────────────────────

    /// Apply a single-input transfer.
    ///
    /// Checks, in order: stateless validity, input count, canonical order,
    /// outpoint liveness, value conservation, signer authorization and (under
    /// `WitnessPolicy::Verify`) the input witness.
    pub fn spend(
        &self,
        ctx: HandlerContext<'_>,
        msg: &SpendTx,
    ) -> Result<ContractEvent, UtxoError> {
        let HandlerContext { state, .. } = ctx;
        msg.validate_basic()?;
        let tx = &msg.tx;

        if tx.inputs.len() != 1 {
            return Err(UtxoError::UnsupportedInputCount {
                count: tx.inputs.len(),
            });
        }
        if !is_canonical(tx) {
            return Err(UtxoError::NonCanonicalOrder);
        }

        let txin = &tx.inputs[0];
        let spent = txin.input;
        let spent_key = outpoint_key(&spent);
        if !state.has(&spent_key) {
            return Err(UtxoError::OutPointNotFound {
                outpoint: spent.to_string(),
            });
        }

        let (value, spender) = resolve_outpoint(&*state, &spent)?;

        match tx.output_value() {
            Some(total) if total == value => {}
            outputs => {
                return Err(UtxoError::ValueConservationViolation {
                    inputs: value,
                    outputs,
                })
            }
        }

        if spender != msg.signer {
            return Err(UtxoError::Unauthorized(format!(
                "{} cannot spend {} owned by {}",
                msg.signer, spent, spender
            )));
        }

        let hash = tx_hash(tx);
        if self.config.witness_policy == WitnessPolicy::Verify {
            self.check_witness(txin, &hash, &spender)?;
        }

        put_record(state, &tx_key(&hash), tx);
        state.delete(&spent_key);
        let mut created = Vec::with_capacity(tx.outputs.len());
        for index in 0..tx.outputs.len() {
            let outpoint = OutPoint::new(hash, index as i32);
            put_record(state, &outpoint_key(&outpoint), &outpoint);
            created.push(outpoint);
        }

        debug!(%hash, %spent, outputs = created.len(), value, "transaction applied");
        Ok(ContractEvent::TransactionApplied(TransactionApplied {
            tx_hash: hash,
            spent,
            created,
            value,
        }))
    }

    fn check_witness(&self, txin: &TxIn, hash: &Hash, spender: &Address) -> Result<(), UtxoError> {
        let witness = Witness::from_bytes(&txin.witness).ok_or_else(|| {
            UtxoError::Unauthorized(format!("input {} has a malformed witness", txin.input))
        })?;
        let signer = self
            .verifier
            .address_from_pubkey(&witness.pubkey)
            .ok_or_else(|| UtxoError::Unauthorized("witness public key is invalid".to_string()))?;
        if &signer != spender {
            return Err(UtxoError::Unauthorized(format!(
                "witness key belongs to {}, output is spendable by {}",
                signer, spender
            )));
        }
        if !self
            .verifier
            .verify(&witness.pubkey, hash.as_bytes(), &witness.signature)
        {
            return Err(UtxoError::Unauthorized(format!(
                "witness signature does not cover transaction {}",
                hash
            )));
        }
        Ok(())
    }
}
