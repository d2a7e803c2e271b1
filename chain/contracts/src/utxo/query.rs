//! Read-only UTXO queries
//!
//! Pure reads over the module namespace. Nothing here writes.

use types::ids::{Address, Hash};

use super::types::{AccountOutput, OutPoint, OutPointValue, Transaction, Wallet};
use super::{resolve_outpoint, tx_key, ACC_PREFIX, OUTPOINT_PREFIX, TX_PREFIX};
use crate::errors::UtxoError;
use crate::store::{load_all, load_record, ReadState};

/// Every account output ever born, spent or not.
pub fn list_account_outputs<S: ReadState + ?Sized>(
    state: &S,
) -> Result<Vec<AccountOutput>, UtxoError> {
    let entries: Vec<(Vec<u8>, AccountOutput)> = load_all(state, ACC_PREFIX.as_bytes())?;
    Ok(entries.into_iter().map(|(_, output)| output).collect())
}

/// Live (unspent) outpoints in key order.
pub fn list_outpoints<S: ReadState + ?Sized>(state: &S) -> Result<Vec<OutPoint>, UtxoError> {
    let entries: Vec<(Vec<u8>, OutPoint)> = load_all(state, OUTPOINT_PREFIX.as_bytes())?;
    Ok(entries.into_iter().map(|(_, outpoint)| outpoint).collect())
}

/// Accepted transactions with their hashes.
pub fn list_transactions<S: ReadState + ?Sized>(
    state: &S,
) -> Result<Vec<(Hash, Transaction)>, UtxoError> {
    let entries: Vec<(Vec<u8>, Transaction)> = load_all(state, TX_PREFIX.as_bytes())?;
    Ok(entries.into_iter().map(|(_, tx)| (tx.hash(), tx)).collect())
}

pub fn get_transaction<S: ReadState + ?Sized>(
    state: &S,
    hash: &Hash,
) -> Result<Transaction, UtxoError> {
    load_record(state, &tx_key(hash))?.ok_or(UtxoError::NotFound(*hash))
}

/// Sum of live outpoints spendable by `address`, with the contributing entries.
pub fn balance<S: ReadState + ?Sized>(state: &S, address: &Address) -> Result<Wallet, UtxoError> {
    let mut wallet = Wallet::default();
    for outpoint in list_outpoints(state)? {
        let (value, owner) = resolve_outpoint(state, &outpoint)?;
        if &owner != address {
            continue;
        }
        wallet.balance += u128::from(value);
        wallet.entries.push(OutPointValue {
            source_id: outpoint.source_id,
            index: outpoint.index,
            value,
        });
    }
    Ok(wallet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{put_record, MemoryStore};
    use crate::utxo::{acc_key, outpoint_key};

    fn seed() -> (MemoryStore, Hash, Transaction) {
        let mut store = MemoryStore::new();
        let alice = Address::new("alice");
        let bob = Address::new("bob");
        let id = Hash::new([4u8; 32]);

        put_record(
            &mut store,
            &acc_key(&id),
            &AccountOutput {
                id,
                value: 100,
                owner: alice.clone(),
                created_at_block: 1,
            },
        );

        let tx = Transaction::pay_to_address(id, -1, 70, 30, &alice, &bob);
        let hash = tx.hash();
        put_record(&mut store, &tx_key(&hash), &tx);
        for index in 0..tx.outputs.len() as i32 {
            let op = OutPoint::new(hash, index);
            put_record(&mut store, &outpoint_key(&op), &op);
        }
        (store, hash, tx)
    }

    #[test]
    fn test_balance_groups_by_owner() {
        let (store, hash, _) = seed();
        let alice = balance(&store, &Address::new("alice")).unwrap();
        assert_eq!(alice.balance, 30);
        assert_eq!(alice.entries.len(), 1);
        assert_eq!(alice.entries[0].source_id, hash);

        let bob = balance(&store, &Address::new("bob")).unwrap();
        assert_eq!(bob.balance, 70);

        let carol = balance(&store, &Address::new("carol")).unwrap();
        assert_eq!(carol, Wallet::default());
    }

    #[test]
    fn test_list_queries() {
        let (store, hash, tx) = seed();
        assert_eq!(list_account_outputs(&store).unwrap().len(), 1);
        assert_eq!(list_outpoints(&store).unwrap().len(), 2);
        assert_eq!(list_transactions(&store).unwrap(), vec![(hash, tx.clone())]);
        assert_eq!(get_transaction(&store, &hash).unwrap(), tx);
    }

    #[test]
    fn test_get_transaction_not_found() {
        let store = MemoryStore::new();
        let missing = Hash::new([8u8; 32]);
        assert_eq!(
            get_transaction(&store, &missing),
            Err(UtxoError::NotFound(missing))
        );
    }
}
