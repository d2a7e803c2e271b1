//! Canonical ordering and hashing of transactions
//!
//! Inputs are ordered by `(source_id bytes, index)` and outputs by
//! `(value, spend_condition bytes)`, both ascending. Ordering is applied when a
//! transaction is built, before it is signed. Validators check the order but
//! never re-sort, so the hash a signer committed to is the hash stored.
//!
//! Serialized layout (all integers big-endian, witnesses excluded):
//!
//! ```text
//! lock_time                u32
//! input count              u32
//!   source_id              [u8; 32]
//!   index                  i32
//!   sequence               u32
//! output count             u32
//!   value                  u64
//!   spend_condition length u32
//!   spend_condition        [u8]
//! ```
//!
//! Transaction hash = `SHA256(SHA256(layout))`.

use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use types::ids::{Address, Hash};
use types::numeric::{BlockHeight, Coin};

use super::types::{OutPoint, Transaction, TxIn, TxOut};
use crate::security::Witness;

fn compare_outputs(a: &TxOut, b: &TxOut) -> Ordering {
    a.value
        .cmp(&b.value)
        .then_with(|| a.spend_condition.cmp(&b.spend_condition))
}

/// Sort inputs and outputs into canonical order in place.
pub fn canonicalize(tx: &mut Transaction) {
    tx.inputs.sort_by(|a, b| a.input.cmp(&b.input));
    tx.outputs.sort_by(compare_outputs);
}

pub fn is_canonical(tx: &Transaction) -> bool {
    let inputs_sorted = tx.inputs.windows(2).all(|w| w[0].input <= w[1].input);
    let outputs_sorted = tx
        .outputs
        .windows(2)
        .all(|w| compare_outputs(&w[0], &w[1]) != Ordering::Greater);
    inputs_sorted && outputs_sorted
}

/// Serialize a transaction as given. Callers canonicalize first.
pub fn canonical_bytes(tx: &Transaction) -> Vec<u8> {
    let mut buf = Vec::with_capacity(12 + tx.inputs.len() * 40 + tx.outputs.len() * 48);
    buf.extend_from_slice(&tx.lock_time.to_be_bytes());

    buf.extend_from_slice(&(tx.inputs.len() as u32).to_be_bytes());
    for txin in &tx.inputs {
        buf.extend_from_slice(txin.input.source_id.as_bytes());
        buf.extend_from_slice(&txin.input.index.to_be_bytes());
        buf.extend_from_slice(&txin.sequence.to_be_bytes());
    }

    buf.extend_from_slice(&(tx.outputs.len() as u32).to_be_bytes());
    for out in &tx.outputs {
        buf.extend_from_slice(&out.value.to_be_bytes());
        buf.extend_from_slice(&(out.spend_condition.len() as u32).to_be_bytes());
        buf.extend_from_slice(&out.spend_condition);
    }
    buf
}

/// Double SHA-256 over the serialized transaction.
pub fn tx_hash(tx: &Transaction) -> Hash {
    let first = Sha256::digest(canonical_bytes(tx));
    let second = Sha256::digest(first);
    Hash::new(second.into())
}

/// Deterministic account-output id.
///
/// Each field is written length-prefixed so adjacent fields cannot run into
/// each other.
pub fn account_output_id(
    chain_id: &str,
    owner: &Address,
    amount: &Coin,
    sequence: u64,
    height: BlockHeight,
) -> Hash {
    let amount = amount.to_string();
    let sequence = sequence.to_be_bytes();
    let height = height.to_be_bytes();
    let fields: [&[u8]; 5] = [
        chain_id.as_bytes(),
        owner.as_bytes(),
        amount.as_bytes(),
        &sequence,
        &height,
    ];

    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update((field.len() as u32).to_be_bytes());
        hasher.update(field);
    }
    Hash::new(hasher.finalize().into())
}

/// Fill every input witness with a signature over the transaction hash.
///
/// The hash excludes witnesses, so signing does not change it.
pub fn sign_transaction(tx: &mut Transaction, signing_key: &SigningKey) {
    let hash = tx_hash(tx);
    let witness = Witness::sign(signing_key, hash.as_bytes()).to_bytes();
    for txin in &mut tx.inputs {
        txin.witness = witness.clone();
    }
}

impl Transaction {
    /// Single-input payment of `amount` to `to`, returning `change` to `from`.
    ///
    /// Zero change is omitted. The result is canonical.
    pub fn pay_to_address(
        source_id: Hash,
        index: i32,
        amount: u64,
        change: u64,
        from: &Address,
        to: &Address,
    ) -> Self {
        let mut outputs = vec![TxOut::pay_to_address(amount, to)];
        if change > 0 {
            outputs.push(TxOut::pay_to_address(change, from));
        }
        let mut tx = Transaction {
            inputs: vec![TxIn::new(OutPoint::new(source_id, index))],
            outputs,
            lock_time: 0,
        };
        canonicalize(&mut tx);
        tx
    }

    pub fn hash(&self) -> Hash {
        tx_hash(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{Ed25519Verifier, SignatureVerifier};

    fn alice() -> Address {
        Address::new("alice")
    }

    fn bob() -> Address {
        Address::new("bob")
    }

    fn two_output_tx() -> Transaction {
        Transaction {
            inputs: vec![
                TxIn::new(OutPoint::new(Hash::new([9u8; 32]), 1)),
                TxIn::new(OutPoint::new(Hash::new([1u8; 32]), 4)),
            ],
            outputs: vec![
                TxOut::pay_to_address(70, &bob()),
                TxOut::pay_to_address(30, &alice()),
            ],
            lock_time: 0,
        }
    }

    #[test]
    fn test_canonicalize_orders_inputs_and_outputs() {
        let mut tx = two_output_tx();
        assert!(!is_canonical(&tx));
        canonicalize(&mut tx);
        assert!(is_canonical(&tx));
        assert_eq!(tx.inputs[0].input.source_id, Hash::new([1u8; 32]));
        assert_eq!(tx.outputs[0].value, 30);
    }

    #[test]
    fn test_hash_independent_of_construction_order() {
        let mut a = two_output_tx();
        let mut b = two_output_tx();
        b.inputs.reverse();
        b.outputs.reverse();
        canonicalize(&mut a);
        canonicalize(&mut b);
        assert_eq!(tx_hash(&a), tx_hash(&b));

        let before = tx_hash(&a);
        canonicalize(&mut a);
        assert_eq!(tx_hash(&a), before);
    }

    #[test]
    fn test_equal_values_ordered_by_condition_bytes() {
        let mut tx = Transaction {
            inputs: vec![],
            outputs: vec![
                TxOut::pay_to_address(5, &bob()),
                TxOut::pay_to_address(5, &alice()),
            ],
            lock_time: 0,
        };
        canonicalize(&mut tx);
        assert_eq!(tx.outputs[0], TxOut::pay_to_address(5, &alice()));
    }

    #[test]
    fn test_hash_excludes_witness() {
        let mut tx = two_output_tx();
        let before = tx_hash(&tx);
        tx.inputs[0].witness = vec![1, 2, 3];
        assert_eq!(tx_hash(&tx), before);
    }

    #[test]
    fn test_hash_covers_sequence_and_lock_time() {
        let tx = two_output_tx();
        let mut seq = tx.clone();
        seq.inputs[0].sequence = 1;
        let mut lock = tx.clone();
        lock.lock_time = 1;
        assert_ne!(tx_hash(&tx), tx_hash(&seq));
        assert_ne!(tx_hash(&tx), tx_hash(&lock));
    }

    #[test]
    fn test_canonical_bytes_layout() {
        let tx = Transaction {
            inputs: vec![TxIn::new(OutPoint::account_birth(Hash::ZERO))],
            outputs: vec![TxOut::pay_to_address(1, &Address::new("b"))],
            lock_time: 7,
        };
        let bytes = canonical_bytes(&tx);
        // 4 + 4 + (32 + 4 + 4) + 4 + (8 + 4 + 2)
        assert_eq!(bytes.len(), 66);
        assert_eq!(&bytes[..4], &[0, 0, 0, 7]);
        assert_eq!(&bytes[40..44], &[0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_account_output_id_is_deterministic() {
        let coin = Coin::new("stake", 100);
        let a = account_output_id("chain", &alice(), &coin, 0, 5);
        let b = account_output_id("chain", &alice(), &coin, 0, 5);
        assert_eq!(a, b);
        assert_ne!(a, account_output_id("chain", &alice(), &coin, 1, 5));
        assert_ne!(a, account_output_id("chain", &alice(), &coin, 0, 6));
        assert_ne!(a, account_output_id("other", &alice(), &coin, 0, 5));
    }

    #[test]
    fn test_account_output_id_fields_are_separated() {
        let coin = Coin::new("stake", 1);
        let a = account_output_id("ab", &Address::new("c"), &coin, 0, 0);
        let b = account_output_id("a", &Address::new("bc"), &coin, 0, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_pay_to_address_helper() {
        let tx = Transaction::pay_to_address(Hash::ZERO, -1, 60, 40, &alice(), &bob());
        assert!(is_canonical(&tx));
        assert_eq!(tx.output_value(), Some(100));

        let no_change = Transaction::pay_to_address(Hash::ZERO, -1, 100, 0, &alice(), &bob());
        assert_eq!(no_change.outputs.len(), 1);
    }

    #[test]
    fn test_sign_transaction_fills_witnesses() {
        let key = SigningKey::from_bytes(&[5u8; 32]);
        let mut tx = Transaction::pay_to_address(Hash::ZERO, -1, 10, 0, &alice(), &bob());
        let hash = tx.hash();
        sign_transaction(&mut tx, &key);
        assert_eq!(tx.hash(), hash);

        let witness = Witness::from_bytes(&tx.inputs[0].witness).unwrap();
        assert!(Ed25519Verifier.verify(&witness.pubkey, hash.as_bytes(), &witness.signature));
    }
}
