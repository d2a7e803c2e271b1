//! State accessor: the per-module key-value namespace
//!
//! Modules never touch a process-wide store. Each handler receives a
//! `StateAccessor` already scoped to its module's namespace and reads or
//! writes through it. Keys are bytes; iteration is in lexicographic key order.
//!
//! Records are stored as JSON. A record that fails to decode is reported as
//! `StateError::Corrupt`, the one condition that is not a plain rejection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::StateError;

/// Read half of the state accessor.
pub trait ReadState {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// All entries whose key starts with `prefix`, in lexicographic key order.
    fn iterate(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// Deterministic key-value access consumed by every module.
pub trait StateAccessor: ReadState {
    fn set(&mut self, key: &[u8], value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);
}

/// In-memory accessor backed by a `BTreeMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReadState for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn has(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    fn iterate(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl StateAccessor for MemoryStore {
    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.entries.insert(key.to_vec(), value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }
}

/// Scopes an accessor to a single namespace by prefixing every key.
///
/// Keys seen through the scoped view never include the prefix.
pub struct PrefixStore<'a> {
    inner: &'a mut dyn StateAccessor,
    prefix: Vec<u8>,
}

impl<'a> PrefixStore<'a> {
    pub fn new(inner: &'a mut dyn StateAccessor, namespace: &str) -> Self {
        let mut prefix = namespace.as_bytes().to_vec();
        prefix.push(b'/');
        Self { inner, prefix }
    }

    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }
}

impl ReadState for PrefixStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(&self.full_key(key))
    }

    fn has(&self, key: &[u8]) -> bool {
        self.inner.has(&self.full_key(key))
    }

    fn iterate(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let strip = self.prefix.len();
        self.inner
            .iterate(&self.full_key(prefix))
            .into_iter()
            .map(|(k, v)| (k[strip..].to_vec(), v))
            .collect()
    }
}

impl StateAccessor for PrefixStore<'_> {
    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        let full = self.full_key(key);
        self.inner.set(&full, value);
    }

    fn delete(&mut self, key: &[u8]) {
        let full = self.full_key(key);
        self.inner.delete(&full);
    }
}

/// Read-only scoped view, used by queries.
pub struct PrefixView<'a> {
    inner: &'a dyn ReadState,
    prefix: Vec<u8>,
}

impl<'a> PrefixView<'a> {
    pub fn new(inner: &'a dyn ReadState, namespace: &str) -> Self {
        let mut prefix = namespace.as_bytes().to_vec();
        prefix.push(b'/');
        Self { inner, prefix }
    }

    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = self.prefix.clone();
        full.extend_from_slice(key);
        full
    }
}

impl ReadState for PrefixView<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(&self.full_key(key))
    }

    fn iterate(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let strip = self.prefix.len();
        self.inner
            .iterate(&self.full_key(prefix))
            .into_iter()
            .map(|(k, v)| (k[strip..].to_vec(), v))
            .collect()
    }
}

/// Encode a record for storage.
///
/// # Panics
///
/// Only if `T`'s `Serialize` impl fails. Every record and message in this
/// crate is a derived struct or enum whose maps, if any, have string keys,
/// and `serde_json` cannot fail on those.
pub fn encode_record<T: Serialize>(record: &T) -> Vec<u8> {
    serde_json::to_vec(record).expect("derived records always serialize")
}

/// Decode a stored record, reporting corruption with the offending key.
pub fn decode_record<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> Result<T, StateError> {
    serde_json::from_slice(bytes).map_err(|e| StateError::Corrupt {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: e.to_string(),
    })
}

/// Load and decode a record, `None` when absent.
pub fn load_record<T: DeserializeOwned, S: ReadState + ?Sized>(
    store: &S,
    key: &[u8],
) -> Result<Option<T>, StateError> {
    match store.get(key) {
        Some(bytes) => decode_record(key, &bytes).map(Some),
        None => Ok(None),
    }
}

/// Decode every record under a prefix.
pub fn load_all<T: DeserializeOwned, S: ReadState + ?Sized>(
    store: &S,
    prefix: &[u8],
) -> Result<Vec<(Vec<u8>, T)>, StateError> {
    store
        .iterate(prefix)
        .into_iter()
        .map(|(k, v)| decode_record(&k, &v).map(|record| (k, record)))
        .collect()
}

/// Encode and store a record.
pub fn put_record<T: Serialize>(store: &mut dyn StateAccessor, key: &[u8], record: &T) {
    store.set(key, encode_record(record));
}
