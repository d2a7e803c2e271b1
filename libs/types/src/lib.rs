//! Types library for the ledger state-machine modules
//!
//! Value types shared by the UTXO ledger, the HTLC engine and the two-party
//! escrow engine. Everything here is deterministic: no randomness, no clocks.
//!
//! # Modules
//! - `ids`: Digests, addresses and contract identifiers
//! - `numeric`: Denominated amounts and block heights
//! - `errors`: Parse and arithmetic errors

pub mod ids;
pub mod numeric;
pub mod errors;

