use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use mds_types::MetadataKey;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::traits::{StoreTx, TxWork, ValueStore};

/// In-memory, `BTreeMap`-based value store.
///
/// Intended for tests and embedding. A transaction holds the store mutex for
/// its whole duration, so transactions are fully serializable. Writes go
/// straight to the map and record the value they displaced; a failed or
/// panicking transaction replays that undo log on drop, leaving the map as it
/// was before the transaction began.
pub struct InMemoryValueStore {
    entries: Mutex<BTreeMap<MetadataKey, Value>>,
}

impl InMemoryValueStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    // A panicking transaction is rolled back during unwinding, so a poisoned
    // lock still guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<MetadataKey, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the store holds no committed entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted list of all committed keys.
    pub fn keys(&self) -> Vec<MetadataKey> {
        self.lock().keys().cloned().collect()
    }
}

impl Default for InMemoryValueStore {
    fn default() -> Self {
        Self::new()
    }
}

struct MemoryTx<'a> {
    entries: &'a mut BTreeMap<MetadataKey, Value>,
    /// Prior state of every written key, oldest first.
    undo: Vec<(MetadataKey, Option<Value>)>,
    committed: bool,
}

impl<'a> MemoryTx<'a> {
    fn begin(entries: &'a mut BTreeMap<MetadataKey, Value>) -> Self {
        Self {
            entries,
            undo: Vec::new(),
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some((key, previous)) = self.undo.pop() {
            match previous {
                Some(value) => {
                    self.entries.insert(key, value);
                }
                None => {
                    self.entries.remove(&key);
                }
            }
        }
    }
}

impl StoreTx for MemoryTx<'_> {
    fn find_for_update(&mut self, key: &MetadataKey) -> StoreResult<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn insert(&mut self, key: &MetadataKey, value: &Value) -> StoreResult<()> {
        if self.entries.contains_key(key) {
            return Err(StoreError::DuplicateKey(key.to_string()));
        }
        self.entries.insert(key.clone(), value.clone());
        self.undo.push((key.clone(), None));
        Ok(())
    }

    fn update(&mut self, key: &MetadataKey, value: &Value) -> StoreResult<u64> {
        match self.entries.get_mut(key) {
            Some(slot) => {
                let previous = std::mem::replace(slot, value.clone());
                self.undo.push((key.clone(), Some(previous)));
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete(&mut self, key: &MetadataKey) -> StoreResult<u64> {
        match self.entries.remove(key) {
            Some(previous) => {
                self.undo.push((key.clone(), Some(previous)));
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_all(&mut self) -> StoreResult<u64> {
        let removed = std::mem::take(&mut *self.entries);
        let count = removed.len() as u64;
        self.undo
            .extend(removed.into_iter().map(|(key, value)| (key, Some(value))));
        Ok(count)
    }

    fn upsert(&mut self, key: &MetadataKey, value: &Value) -> StoreResult<()> {
        let previous = self.entries.insert(key.clone(), value.clone());
        self.undo.push((key.clone(), previous));
        Ok(())
    }
}

impl ValueStore for InMemoryValueStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn migrate(&self) -> StoreResult<()> {
        Ok(())
    }

    fn run_transaction(&self, work: TxWork<'_>) -> StoreResult<()> {
        let mut entries = self.lock();
        let mut tx = MemoryTx::begin(&mut entries);
        work(&mut tx)?;
        tx.commit();
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryValueStore")
            .field("entry_count", &self.len())
            .finish()
    }
}
