//! Transactional value storage for the metadata store.
//!
//! A value store is a durable mapping from [`MetadataKey`] to a JSON
//! document. Every access goes through a transaction: the caller hands a
//! closure to [`ValueStoreExt::transaction`], the closure runs against a
//! [`StoreTx`], and the store commits if it returns `Ok` and rolls back
//! otherwise.
//!
//! # Storage Backends
//!
//! All backends implement the [`ValueStore`] trait:
//!
//! - [`InMemoryValueStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`SqliteValueStore`] -- single-file SQLite database (bundled, no system library)
//!
//! # Design Rules
//!
//! 1. No partial write is ever visible: a failed transaction leaves the store untouched.
//! 2. [`StoreTx::find_for_update`] holds a write lock until the transaction ends,
//!    so read-modify-write sequences never act on stale data.
//! 3. The store never interprets document contents.
//! 4. Only validated keys can be expressed, since every operation takes a [`MetadataKey`].
//!
//! [`MetadataKey`]: mds_types::MetadataKey

pub mod config;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use config::{open_store, StoreBackend, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryValueStore;
pub use sqlite::{SqliteValueStore, Synchronous};
pub use traits::{StoreTx, TxWork, ValueStore, ValueStoreExt};
