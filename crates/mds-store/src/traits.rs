use mds_types::MetadataKey;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Operations available inside one transaction.
///
/// Row counts follow SQL semantics: an update or delete that matches no
/// entry returns `Ok(0)` rather than an error. Callers decide whether zero
/// rows is a failure.
pub trait StoreTx {
    /// Read the document for `key`, locking it against other writers until
    /// the transaction ends.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn find_for_update(&mut self, key: &MetadataKey) -> StoreResult<Option<Value>>;

    /// Insert a new entry. Fails with [`StoreError::DuplicateKey`] if the key exists.
    fn insert(&mut self, key: &MetadataKey, value: &Value) -> StoreResult<()>;

    /// Overwrite the document of an existing entry. Returns rows affected.
    fn update(&mut self, key: &MetadataKey, value: &Value) -> StoreResult<u64>;

    /// Remove one entry. Returns rows affected.
    fn delete(&mut self, key: &MetadataKey) -> StoreResult<u64>;

    /// Remove every entry. Returns rows affected.
    fn delete_all(&mut self) -> StoreResult<u64>;

    /// Insert the entry, or replace its document if the key exists.
    fn upsert(&mut self, key: &MetadataKey, value: &Value) -> StoreResult<()>;
}

/// Work executed inside a transaction.
pub type TxWork<'a> = Box<dyn FnOnce(&mut dyn StoreTx) -> StoreResult<()> + 'a>;

/// Durable key to JSON document mapping.
///
/// All implementations must satisfy these invariants:
/// - `run_transaction` commits iff `work` returns `Ok`; on error nothing the
///   work did is visible to any later transaction.
/// - Transactions on the same key are serialized: a document read with
///   [`StoreTx::find_for_update`] cannot change until the reading transaction ends.
/// - The store never interprets document contents.
pub trait ValueStore: Send + Sync {
    /// Short backend identifier used in logs.
    fn backend_name(&self) -> &'static str;

    /// Create the schema if it does not exist. Idempotent.
    fn migrate(&self) -> StoreResult<()>;

    /// Run `work` in one transaction: commit on `Ok`, roll back on `Err`.
    fn run_transaction(&self, work: TxWork<'_>) -> StoreResult<()>;
}

/// Typed transactions over any [`ValueStore`], including trait objects.
pub trait ValueStoreExt {
    /// Run `work` in one transaction and return its result.
    ///
    /// The error type is the caller's: an `Err` from `work` rolls the
    /// transaction back and is returned unchanged, while failures to begin or
    /// commit arrive through `E: From<StoreError>`.
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>;
}

impl<S: ValueStore + ?Sized> ValueStoreExt for S {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
    {
        let mut output = None;
        let run = self.run_transaction(Box::new(|tx: &mut dyn StoreTx| {
            let result = work(tx);
            let aborted = result.is_err();
            output = Some(result);
            if aborted {
                Err(StoreError::Aborted)
            } else {
                Ok(())
            }
        }));
        match (run, output) {
            (_, Some(Err(err))) => Err(err),
            (Ok(()), Some(Ok(value))) => Ok(value),
            (Err(err), _) => Err(err.into()),
            (Ok(()), None) => Err(StoreError::Backend(
                "transaction committed without running its work".into(),
            )
            .into()),
        }
    }
}
