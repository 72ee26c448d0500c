use std::sync::Arc;

use mds_types::{MetadataEntry, MetadataKey, PartialDocument};
use serde_json::Value;

use crate::error::MetadataResult;
use crate::repository::MetadataRepository;

/// Entry point for metadata operations.
///
/// Every keyed operation validates its key before the repository is touched,
/// so a malformed key never reaches the value store. The service holds no
/// entry state between calls.
pub struct MetadataService<R: ?Sized = dyn MetadataRepository> {
    repo: Arc<R>,
}

impl<R: ?Sized> Clone for MetadataService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

fn validate(key: &str) -> MetadataResult<MetadataKey> {
    MetadataKey::parse(key).map_err(|err| {
        tracing::debug!(key, error = %err, "rejected metadata key");
        err.into()
    })
}

impl<R: MetadataRepository + ?Sized> MetadataService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub fn create(&self, key: &str, value: Value) -> MetadataResult<MetadataEntry> {
        let entry = MetadataEntry::new(validate(key)?, value);
        tracing::debug!(key, "create");
        self.repo.create(&entry)?;
        Ok(entry)
    }

    pub fn get(&self, key: &str) -> MetadataResult<MetadataEntry> {
        let key = validate(key)?;
        tracing::debug!(%key, "get");
        self.repo.get(&key)
    }

    /// Replace the whole value of an existing entry.
    pub fn update(&self, key: &str, value: Value) -> MetadataResult<MetadataEntry> {
        let entry = MetadataEntry::new(validate(key)?, value);
        tracing::debug!(key, "update");
        self.repo.update(&entry)?;
        Ok(entry)
    }

    /// Shallow-merge `partial` into the stored document.
    ///
    /// An empty `partial` is accepted and still runs a transaction. The merged
    /// document is not returned; read it back with [`Self::get`], which may
    /// observe a later write.
    pub fn patch_update(&self, key: &str, partial: &PartialDocument) -> MetadataResult<()> {
        let key = validate(key)?;
        tracing::debug!(%key, fields = partial.len(), "patch update");
        self.repo.patch_update(&key, partial)
    }

    pub fn delete(&self, key: &str) -> MetadataResult<()> {
        let key = validate(key)?;
        tracing::debug!(%key, "delete");
        self.repo.delete(&key)
    }

    /// Remove every entry. Takes no key, so nothing is validated.
    pub fn delete_all(&self) -> MetadataResult<u64> {
        let removed = self.repo.delete_all()?;
        tracing::debug!(removed, "delete all");
        Ok(removed)
    }

    pub fn upsert(&self, key: &str, value: Value) -> MetadataResult<MetadataEntry> {
        let entry = MetadataEntry::new(validate(key)?, value);
        tracing::debug!(key, "upsert");
        self.repo.upsert(&entry)?;
        Ok(entry)
    }
}
