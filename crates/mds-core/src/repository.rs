//! The [`MetadataRepository`] trait and its value-store provider.
//!
//! Every method is one atomic value-store transaction. Store-native signals
//! are translated here: a primary-key collision becomes
//! [`MetadataError::DuplicateKey`], a zero-row result on a keyed write becomes
//! [`MetadataError::NotFound`], anything else is [`MetadataError::Storage`].

use std::sync::Arc;

use mds_store::{ValueStore, ValueStoreExt};
use mds_types::{MetadataEntry, MetadataKey, PartialDocument};
use serde_json::Value;

use crate::error::{MetadataError, MetadataResult};
use crate::merge::{into_object, shallow_merge};

/// Persistence operations on metadata entries.
///
/// Keys arriving here are already validated; callers outside this crate go
/// through [`crate::MetadataService`].
pub trait MetadataRepository: Send + Sync {
    /// Insert a new entry. Fails with `DuplicateKey` if the key exists.
    fn create(&self, entry: &MetadataEntry) -> MetadataResult<()>;

    /// Point lookup. Fails with `NotFound` if absent.
    fn get(&self, key: &MetadataKey) -> MetadataResult<MetadataEntry>;

    /// Replace the value of an existing entry. Fails with `NotFound` if absent.
    fn update(&self, entry: &MetadataEntry) -> MetadataResult<()>;

    /// Shallow-merge `partial` into the stored document, reading and writing
    /// in one transaction. Fails with `NotFound` if absent, leaving the store
    /// unchanged.
    fn patch_update(&self, key: &MetadataKey, partial: &PartialDocument) -> MetadataResult<()>;

    /// Remove one entry. Fails with `NotFound` if zero rows were removed.
    fn delete(&self, key: &MetadataKey) -> MetadataResult<()>;

    /// Remove every entry and return how many were removed. Succeeds on an
    /// empty store.
    fn delete_all(&self) -> MetadataResult<u64>;

    /// Insert, or fully replace the value of an existing entry.
    fn upsert(&self, entry: &MetadataEntry) -> MetadataResult<()>;
}

/// [`MetadataRepository`] backed by any [`ValueStore`].
pub struct StoreRepository<S: ?Sized = dyn ValueStore> {
    store: Arc<S>,
}

impl<S: ValueStore + ?Sized> StoreRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: ?Sized> Clone for StoreRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

fn not_found(key: &MetadataKey) -> MetadataError {
    MetadataError::NotFound(key.to_string())
}

impl<S: ValueStore + ?Sized> MetadataRepository for StoreRepository<S> {
    fn create(&self, entry: &MetadataEntry) -> MetadataResult<()> {
        Ok(self
            .store
            .transaction(|tx| tx.insert(&entry.my_key, &entry.my_value))?)
    }

    fn get(&self, key: &MetadataKey) -> MetadataResult<MetadataEntry> {
        let value: Option<Value> = self.store.transaction(|tx| tx.find_for_update(key))?;
        value
            .map(|my_value| MetadataEntry::new(key.clone(), my_value))
            .ok_or_else(|| not_found(key))
    }

    fn update(&self, entry: &MetadataEntry) -> MetadataResult<()> {
        self.store.transaction(|tx| -> MetadataResult<()> {
            match tx.update(&entry.my_key, &entry.my_value)? {
                0 => Err(not_found(&entry.my_key)),
                _ => Ok(()),
            }
        })
    }

    fn patch_update(&self, key: &MetadataKey, partial: &PartialDocument) -> MetadataResult<()> {
        self.store.transaction(|tx| -> MetadataResult<()> {
            let existing = tx.find_for_update(key)?.ok_or_else(|| not_found(key))?;
            let mut fields = into_object(key, existing)?;
            shallow_merge(&mut fields, partial);
            tx.update(key, &Value::Object(fields))?;
            Ok(())
        })
    }

    fn delete(&self, key: &MetadataKey) -> MetadataResult<()> {
        let removed = self.store.transaction(|tx| tx.delete(key))?;
        if removed == 0 {
            return Err(not_found(key));
        }
        Ok(())
    }

    fn delete_all(&self) -> MetadataResult<u64> {
        Ok(self.store.transaction(|tx| tx.delete_all())?)
    }

    fn upsert(&self, entry: &MetadataEntry) -> MetadataResult<()> {
        Ok(self
            .store
            .transaction(|tx| tx.upsert(&entry.my_key, &entry.my_value))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mds_store::{InMemoryValueStore, SqliteValueStore};
    use serde_json::json;

    fn key(s: &str) -> MetadataKey {
        MetadataKey::parse(s).unwrap()
    }

    fn entry(k: &str, value: Value) -> MetadataEntry {
        MetadataEntry::new(key(k), value)
    }

    fn partial(value: Value) -> PartialDocument {
        serde_json::from_value(value).unwrap()
    }

    fn memory_repo() -> (Arc<InMemoryValueStore>, StoreRepository<InMemoryValueStore>) {
        let store = Arc::new(InMemoryValueStore::new());
        (Arc::clone(&store), StoreRepository::new(store))
    }

    #[test]
    fn create_then_get() {
        let (_, repo) = memory_repo();
        let value = json!({"owner": "team-a", "replicas": 3});
        repo.create(&entry("svc", value.clone())).unwrap();
        assert_eq!(repo.get(&key("svc")).unwrap().my_value, value);
    }

    #[test]
    fn second_create_is_duplicate_and_keeps_first_value() {
        let (_, repo) = memory_repo();
        repo.create(&entry("svc", json!({"v": 1}))).unwrap();
        let err = repo.create(&entry("svc", json!({"v": 2}))).unwrap_err();
        assert!(matches!(err, MetadataError::DuplicateKey(ref k) if k == "svc"));
        assert_eq!(repo.get(&key("svc")).unwrap().my_value, json!({"v": 1}));
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_, repo) = memory_repo();
        assert!(matches!(repo.get(&key("nope")), Err(MetadataError::NotFound(_))));
    }

    #[test]
    fn update_replaces_value() {
        let (_, repo) = memory_repo();
        repo.create(&entry("svc", json!({"a": 1, "b": 2}))).unwrap();
        repo.update(&entry("svc", json!({"c": 3}))).unwrap();
        assert_eq!(repo.get(&key("svc")).unwrap().my_value, json!({"c": 3}));
    }

    #[test]
    fn update_missing_is_not_found_and_creates_nothing() {
        let (store, repo) = memory_repo();
        let err = repo.update(&entry("ghost", json!({}))).unwrap_err();
        assert!(matches!(err, MetadataError::NotFound(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn patch_update_merges_shallowly() {
        let (_, repo) = memory_repo();
        repo.create(&entry("k", json!({"a": 1, "b": 2}))).unwrap();
        repo.patch_update(&key("k"), &partial(json!({"b": 3, "c": 4})))
            .unwrap();
        assert_eq!(
            repo.get(&key("k")).unwrap().my_value,
            json!({"a": 1, "b": 3, "c": 4})
        );
    }

    #[test]
    fn patch_update_missing_is_not_found_and_creates_nothing() {
        let (store, repo) = memory_repo();
        let err = repo
            .patch_update(&key("ghost"), &partial(json!({"a": 1})))
            .unwrap_err();
        assert!(matches!(err, MetadataError::NotFound(ref k) if k == "ghost"));
        assert!(store.is_empty());
    }

    #[test]
    fn patch_update_with_empty_partial_keeps_document() {
        let (_, repo) = memory_repo();
        repo.create(&entry("k", json!({"a": 1}))).unwrap();
        repo.patch_update(&key("k"), &PartialDocument::default()).unwrap();
        assert_eq!(repo.get(&key("k")).unwrap().my_value, json!({"a": 1}));
    }

    #[test]
    fn patch_update_on_non_object_is_storage_failure_and_unchanged() {
        let (_, repo) = memory_repo();
        repo.create(&entry("list", json!([1, 2, 3]))).unwrap();
        let err = repo
            .patch_update(&key("list"), &partial(json!({"a": 1})))
            .unwrap_err();
        assert!(matches!(err, MetadataError::Storage(_)));
        assert_eq!(repo.get(&key("list")).unwrap().my_value, json!([1, 2, 3]));
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let (_, repo) = memory_repo();
        repo.create(&entry("k", json!({}))).unwrap();
        repo.delete(&key("k")).unwrap();
        assert!(matches!(repo.get(&key("k")), Err(MetadataError::NotFound(_))));
        assert!(matches!(repo.delete(&key("k")), Err(MetadataError::NotFound(_))));
    }

    #[test]
    fn delete_all_empties_store() {
        let (store, repo) = memory_repo();
        for k in ["a", "b", "c"] {
            repo.create(&entry(k, json!({"k": k}))).unwrap();
        }
        assert_eq!(repo.delete_all().unwrap(), 3);
        assert!(store.is_empty());
        for k in ["a", "b", "c"] {
            assert!(matches!(repo.get(&key(k)), Err(MetadataError::NotFound(_))));
        }
        assert_eq!(repo.delete_all().unwrap(), 0);
    }

    #[test]
    fn upsert_creates_then_fully_replaces() {
        let (_, repo) = memory_repo();
        repo.upsert(&entry("k", json!({"a": 1, "b": 2}))).unwrap();
        assert_eq!(repo.get(&key("k")).unwrap().my_value, json!({"a": 1, "b": 2}));

        repo.upsert(&entry("k", json!({"c": 3}))).unwrap();
        assert_eq!(repo.get(&key("k")).unwrap().my_value, json!({"c": 3}));
    }

    #[test]
    fn works_over_trait_object_store() {
        let store: Arc<dyn ValueStore> = Arc::new(SqliteValueStore::open_in_memory().unwrap());
        let repo: StoreRepository = StoreRepository::new(store);
        repo.create(&entry("k", json!({"a": 1, "b": 2}))).unwrap();
        repo.patch_update(&key("k"), &partial(json!({"b": 3, "c": 4})))
            .unwrap();
        assert_eq!(
            repo.get(&key("k")).unwrap().my_value,
            json!({"a": 1, "b": 3, "c": 4})
        );
        assert!(matches!(
            repo.create(&entry("k", json!({}))),
            Err(MetadataError::DuplicateKey(_))
        ));
    }
}
