//! SQLite-backed value store.
//!
//! Uses `rusqlite` with the `bundled` feature so no system SQLite library is
//! required. Documents are stored as JSON text in a single table keyed by
//! `my_key`. Every transaction starts with `BEGIN IMMEDIATE`, which takes the
//! database write lock up front: a read followed by a write in the same
//! transaction cannot interleave with another writer.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use mds_types::MetadataKey;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::traits::{StoreTx, TxWork, ValueStore};

/// Name of the table holding all entries.
pub const TABLE_NAME: &str = "metadata_table";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS metadata_table (
        my_key   TEXT PRIMARY KEY NOT NULL,
        my_value TEXT NOT NULL CHECK (json_valid(my_value))
    );
";

/// SQLite `synchronous` setting for file-backed databases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    /// Fsync on every commit. No committed transaction is lost on power failure.
    #[default]
    Full,
    /// Fsync at WAL checkpoints only. Faster, but the most recent commits can
    /// be lost on power failure (never corrupted).
    Normal,
}

impl Synchronous {
    fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Normal => "NORMAL",
        }
    }
}

/// Value store backed by a single SQLite database file.
pub struct SqliteValueStore {
    conn: Mutex<Connection>,
    location: Option<PathBuf>,
}

impl SqliteValueStore {
    /// Open (or create) the database at `path` with `synchronous = FULL`.
    ///
    /// The schema is not created here; call [`ValueStore::migrate`] before use.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> StoreResult<Self> {
        Self::open_with(path, busy_timeout, Synchronous::Full)
    }

    /// Like [`open`](Self::open), with an explicit durability setting.
    pub fn open_with(
        path: impl AsRef<Path>,
        busy_timeout: Duration,
        synchronous: Synchronous,
    ) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", synchronous.pragma_value())?;
        Ok(Self {
            conn: Mutex::new(conn),
            location: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database, already migrated.
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            location: None,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Path of the database file, or `None` for an in-memory database.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Backend(format!("connection lock poisoned: {e}")))
    }
}

fn encode(value: &Value) -> StoreResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode(text: &str) -> StoreResult<Value> {
    Ok(serde_json::from_str(text)?)
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

struct SqliteTx<'a, 'conn> {
    tx: &'a Transaction<'conn>,
}

impl StoreTx for SqliteTx<'_, '_> {
    fn find_for_update(&mut self, key: &MetadataKey) -> StoreResult<Option<Value>> {
        // The IMMEDIATE transaction already holds the write lock.
        let text: Option<String> = self
            .tx
            .query_row(
                "SELECT my_value FROM metadata_table WHERE my_key = ?1",
                params![key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        text.as_deref().map(decode).transpose()
    }

    fn insert(&mut self, key: &MetadataKey, value: &Value) -> StoreResult<()> {
        let encoded = encode(value)?;
        match self.tx.execute(
            "INSERT INTO metadata_table (my_key, my_value) VALUES (?1, ?2)",
            params![key.as_str(), encoded],
        ) {
            Ok(_) => Ok(()),
            Err(err) if is_primary_key_violation(&err) => {
                Err(StoreError::DuplicateKey(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update(&mut self, key: &MetadataKey, value: &Value) -> StoreResult<u64> {
        let encoded = encode(value)?;
        let rows = self.tx.execute(
            "UPDATE metadata_table SET my_value = ?2 WHERE my_key = ?1",
            params![key.as_str(), encoded],
        )?;
        Ok(rows as u64)
    }

    fn delete(&mut self, key: &MetadataKey) -> StoreResult<u64> {
        let rows = self.tx.execute(
            "DELETE FROM metadata_table WHERE my_key = ?1",
            params![key.as_str()],
        )?;
        Ok(rows as u64)
    }

    fn delete_all(&mut self) -> StoreResult<u64> {
        let rows = self.tx.execute("DELETE FROM metadata_table", [])?;
        Ok(rows as u64)
    }

    fn upsert(&mut self, key: &MetadataKey, value: &Value) -> StoreResult<()> {
        let encoded = encode(value)?;
        self.tx.execute(
            "INSERT INTO metadata_table (my_key, my_value) VALUES (?1, ?2)
             ON CONFLICT (my_key) DO UPDATE SET my_value = excluded.my_value",
            params![key.as_str(), encoded],
        )?;
        Ok(())
    }
}

impl ValueStore for SqliteValueStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn migrate(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(table = TABLE_NAME, "sqlite schema ready");
        Ok(())
    }

    fn run_transaction(&self, work: TxWork<'_>) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = work(&mut SqliteTx { tx: &tx });
        match outcome {
            Ok(()) => {
                tx.commit()?;
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!(error = %rollback_err, "sqlite rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for SqliteValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteValueStore")
            .field("location", &self.location)
            .finish()
    }
}
