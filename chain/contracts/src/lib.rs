//! Deterministic ledger modules for a replicated state machine
//!
//! Three financial primitives share one execution model: a typed message
//! arrives, is validated against persisted state, and either mutates state
//! deterministically or is rejected with no side effects.
//!
//! # Modules
//! - `utxo`: Account-output births, single-input transfers, canonical hashing
//! - `htlc`: Hash-time-locked contracts with redeem/timeout resolution
//! - `escrow`: Two-party multisig escrow with staged funding
//! - `dispatch`: Message routing, raw decoding, event log and queries
//! - `store`: Per-module key-value namespaces and record encoding
//! - `bank`: Balance ledger and account sequences consumed by handlers
//! - `context`: Block info and per-handler collaborators
//! - `security`: Signature verification and input witnesses
//! - `config`: Module configuration
//! - `events`: Events emitted by successful handlers
//! - `errors`: Rejection and corruption error types

pub mod bank;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod escrow;
pub mod events;
pub mod htlc;
pub mod security;
pub mod store;
pub mod utxo;
