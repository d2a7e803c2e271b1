//! Message routing, event log and queries
//!
//! The dispatcher owns the backing store and the account layer. Each message
//! is matched exhaustively to its handler, which receives only its module's
//! prefixed namespace. Rejected messages leave no trace in state or in the
//! event log.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use types::ids::{Address, EscrowId, Hash};

use crate::bank::Accounts;
use crate::config::ModuleConfig;
use crate::context::{BlockInfo, HandlerContext};
use crate::errors::ContractError;
use crate::escrow::{
    self, AbortEscrow, EscrowContract, EscrowEngine, InitEscrow, JoinEscrow, SpendEscrow,
};
use crate::events::ContractEvent;
use crate::htlc::{self, AddHtlc, FailHtlc, Htlc, HtlcEngine, RedeemHtlc};
use crate::security::SignatureVerifier;
use crate::store::{encode_record, PrefixStore, PrefixView, StateAccessor};
use crate::utxo::msgs::{BirthOutput, SpendTx};
use crate::utxo::query as utxo_query;
use crate::utxo::types::{AccountOutput, OutPoint, Transaction, Wallet};
use crate::utxo::UtxoLedger;

pub const MODULE_UTXO: &str = "utxo";
pub const MODULE_HTLC: &str = "htlc";
pub const MODULE_MULTISIG: &str = "multisig";

// ───────────────────────── Messages ─────────────────────────

/// Every operation the modules accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    BirthOutput(BirthOutput),
    Spend(SpendTx),
    AddHtlc(AddHtlc),
    RedeemHtlc(RedeemHtlc),
    FailHtlc(FailHtlc),
    InitEscrow(InitEscrow),
    AbortEscrow(AbortEscrow),
    JoinEscrow(JoinEscrow),
    SpendEscrow(SpendEscrow),
}

impl Message {
    /// `(module, operation)` tag.
    pub fn route(&self) -> (&'static str, &'static str) {
        match self {
            Message::BirthOutput(_) => (MODULE_UTXO, "birth_acc_output"),
            Message::Spend(_) => (MODULE_UTXO, "tx"),
            Message::AddHtlc(_) => (MODULE_HTLC, "add_htlc"),
            Message::RedeemHtlc(_) => (MODULE_HTLC, "redeem_htlc"),
            Message::FailHtlc(_) => (MODULE_HTLC, "fail_htlc"),
            Message::InitEscrow(_) => (MODULE_MULTISIG, "init_multisig"),
            Message::AbortEscrow(_) => (MODULE_MULTISIG, "abort_multisig"),
            Message::JoinEscrow(_) => (MODULE_MULTISIG, "join_multisig"),
            Message::SpendEscrow(_) => (MODULE_MULTISIG, "spend_multisig"),
        }
    }

    /// Addresses the envelope must authenticate.
    pub fn signers(&self) -> Vec<Address> {
        match self {
            Message::BirthOutput(m) => m.signers(),
            Message::Spend(m) => m.signers(),
            Message::AddHtlc(m) => m.signers(),
            Message::RedeemHtlc(m) => m.signers(),
            Message::FailHtlc(m) => m.signers(),
            Message::InitEscrow(m) => m.signers(),
            Message::AbortEscrow(m) => m.signers(),
            Message::JoinEscrow(m) => m.signers(),
            Message::SpendEscrow(m) => m.signers(),
        }
    }

    /// Stateless checks, for hosts that screen messages before ordering.
    pub fn validate_basic(&self) -> Result<(), ContractError> {
        match self {
            Message::BirthOutput(m) => m.validate_basic()?,
            Message::Spend(m) => m.validate_basic()?,
            Message::AddHtlc(m) => m.validate_basic()?,
            Message::RedeemHtlc(m) => m.validate_basic()?,
            Message::FailHtlc(m) => m.validate_basic()?,
            Message::InitEscrow(m) => m.validate_basic()?,
            Message::AbortEscrow(m) => m.validate_basic()?,
            Message::JoinEscrow(m) => m.validate_basic()?,
            Message::SpendEscrow(m) => m.validate_basic()?,
        }
        Ok(())
    }
}

/// Transport form of a message: a route tag plus a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub module: String,
    pub operation: String,
    pub payload: Vec<u8>,
}

fn decode_payload<T: DeserializeOwned>(raw: &RawMessage) -> Result<T, ContractError> {
    serde_json::from_slice(&raw.payload).map_err(|e| {
        ContractError::InvalidMessage(format!(
            "{}/{}: undecodable payload: {}",
            raw.module, raw.operation, e
        ))
    })
}

impl RawMessage {
    pub fn from_message(msg: &Message) -> Self {
        let (module, operation) = msg.route();
        let payload = match msg {
            Message::BirthOutput(m) => encode_record(m),
            Message::Spend(m) => encode_record(m),
            Message::AddHtlc(m) => encode_record(m),
            Message::RedeemHtlc(m) => encode_record(m),
            Message::FailHtlc(m) => encode_record(m),
            Message::InitEscrow(m) => encode_record(m),
            Message::AbortEscrow(m) => encode_record(m),
            Message::JoinEscrow(m) => encode_record(m),
            Message::SpendEscrow(m) => encode_record(m),
        };
        Self {
            module: module.to_string(),
            operation: operation.to_string(),
            payload,
        }
    }

    pub fn decode(&self) -> Result<Message, ContractError> {
        let msg = match (self.module.as_str(), self.operation.as_str()) {
            (MODULE_UTXO, "birth_acc_output") => Message::BirthOutput(decode_payload(self)?),
            (MODULE_UTXO, "tx") => Message::Spend(decode_payload(self)?),
            (MODULE_HTLC, "add_htlc") => Message::AddHtlc(decode_payload(self)?),
            (MODULE_HTLC, "redeem_htlc") => Message::RedeemHtlc(decode_payload(self)?),
            (MODULE_HTLC, "fail_htlc") => Message::FailHtlc(decode_payload(self)?),
            (MODULE_MULTISIG, "init_multisig") => Message::InitEscrow(decode_payload(self)?),
            (MODULE_MULTISIG, "abort_multisig") => Message::AbortEscrow(decode_payload(self)?),
            (MODULE_MULTISIG, "join_multisig") => Message::JoinEscrow(decode_payload(self)?),
            (MODULE_MULTISIG, "spend_multisig") => Message::SpendEscrow(decode_payload(self)?),
            _ => {
                return Err(ContractError::UnknownOperation {
                    module: self.module.clone(),
                    operation: self.operation.clone(),
                })
            }
        };
        Ok(msg)
    }
}

// ───────────────────────── Queries ─────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    ListAccountOutputs,
    ListOutPoints,
    ListTransactions,
    GetTransaction(Hash),
    Balance(Address),
    GetHtlc(Hash),
    GetEscrow(EscrowId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryResponse {
    AccountOutputs(Vec<AccountOutput>),
    OutPoints(Vec<OutPoint>),
    Transactions(Vec<(Hash, Transaction)>),
    Transaction(Transaction),
    Wallet(Wallet),
    Htlc(Htlc),
    Escrow(EscrowContract),
}

// ───────────────────────── Dispatcher ─────────────────────────

pub struct Dispatcher<S: StateAccessor, B: Accounts> {
    store: S,
    bank: B,
    utxo: UtxoLedger,
    htlc: HtlcEngine,
    escrow: EscrowEngine,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl<S: StateAccessor, B: Accounts> Dispatcher<S, B> {
    pub fn new(store: S, bank: B, config: ModuleConfig) -> Self {
        Self {
            store,
            bank,
            utxo: UtxoLedger::new(config),
            htlc: HtlcEngine::new(),
            escrow: EscrowEngine::new(),
            events: Vec::new(),
        }
    }

    /// Replace the signature verifier used under `WitnessPolicy::Verify`.
    pub fn with_verifier(mut self, verifier: Box<dyn SignatureVerifier>) -> Self {
        self.utxo = self.utxo.with_verifier(verifier);
        self
    }

    /// Apply one message in block `block`.
    ///
    /// On rejection nothing is written and no event is recorded.
    pub fn deliver(
        &mut self,
        block: &BlockInfo,
        msg: Message,
    ) -> Result<ContractEvent, ContractError> {
        let (module, operation) = msg.route();
        debug!(module, operation, height = block.height, "delivering message");

        let result = self.execute(block, &msg);
        match &result {
            Ok(event) => {
                info!(module, operation, height = block.height, "message applied");
                self.events.push(event.clone());
            }
            Err(e) if e.is_fatal() => {
                error!(
                    module,
                    operation,
                    height = block.height,
                    error = %e,
                    "corrupt module state"
                );
            }
            Err(e) => {
                warn!(module, operation, height = block.height, error = %e, "message rejected");
            }
        }
        result
    }

    /// Decode a transport message and deliver it.
    pub fn deliver_raw(
        &mut self,
        block: &BlockInfo,
        raw: &RawMessage,
    ) -> Result<ContractEvent, ContractError> {
        match raw.decode() {
            Ok(msg) => self.deliver(block, msg),
            Err(e) => {
                warn!(
                    module = %raw.module,
                    operation = %raw.operation,
                    height = block.height,
                    error = %e,
                    "message rejected before routing"
                );
                Err(e)
            }
        }
    }

    fn execute(
        &mut self,
        block: &BlockInfo,
        msg: &Message,
    ) -> Result<ContractEvent, ContractError> {
        let (module, _) = msg.route();
        let mut state = PrefixStore::new(&mut self.store, module);
        let ctx = HandlerContext {
            block,
            state: &mut state,
            bank: &mut self.bank,
        };

        let event = match msg {
            Message::BirthOutput(m) => self.utxo.birth_output(ctx, m)?,
            Message::Spend(m) => self.utxo.spend(ctx, m)?,
            Message::AddHtlc(m) => self.htlc.add(ctx, m)?,
            Message::RedeemHtlc(m) => self.htlc.redeem(ctx, m)?,
            Message::FailHtlc(m) => self.htlc.fail(ctx, m)?,
            Message::InitEscrow(m) => self.escrow.init(ctx, m)?,
            Message::AbortEscrow(m) => self.escrow.abort(ctx, m)?,
            Message::JoinEscrow(m) => self.escrow.join(ctx, m)?,
            Message::SpendEscrow(m) => self.escrow.spend(ctx, m)?,
        };
        Ok(event)
    }

    /// Answer a read-only query.
    pub fn query(&self, query: &Query) -> Result<QueryResponse, ContractError> {
        let utxo = PrefixView::new(&self.store, MODULE_UTXO);
        let response = match query {
            Query::ListAccountOutputs => {
                QueryResponse::AccountOutputs(utxo_query::list_account_outputs(&utxo)?)
            }
            Query::ListOutPoints => QueryResponse::OutPoints(utxo_query::list_outpoints(&utxo)?),
            Query::ListTransactions => {
                QueryResponse::Transactions(utxo_query::list_transactions(&utxo)?)
            }
            Query::GetTransaction(hash) => {
                QueryResponse::Transaction(utxo_query::get_transaction(&utxo, hash)?)
            }
            Query::Balance(address) => QueryResponse::Wallet(utxo_query::balance(&utxo, address)?),
            Query::GetHtlc(hash) => {
                let view = PrefixView::new(&self.store, MODULE_HTLC);
                QueryResponse::Htlc(htlc::get_htlc(&view, hash)?)
            }
            Query::GetEscrow(id) => {
                let view = PrefixView::new(&self.store, MODULE_MULTISIG);
                QueryResponse::Escrow(escrow::get_escrow(&view, id)?)
            }
        };
        Ok(response)
    }

    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Host-side access to the account layer (genesis funding, sequences).
    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }
}
