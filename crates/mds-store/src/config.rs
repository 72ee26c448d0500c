use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::memory::InMemoryValueStore;
use crate::sqlite::{SqliteValueStore, Synchronous};
use crate::traits::ValueStore;

/// Which [`ValueStore`] implementation to open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Volatile, process-local storage.
    Memory,
    /// Durable single-file SQLite database.
    #[default]
    Sqlite,
}

/// Configuration for the value store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database file for the SQLite backend. Ignored by the memory backend.
    pub path: PathBuf,
    /// How long a SQLite transaction waits for a competing writer.
    pub busy_timeout_ms: u64,
    /// SQLite durability: `"full"` (default) or `"normal"`.
    pub synchronous: Synchronous,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: PathBuf::from("metadata.db"),
            busy_timeout_ms: 5_000,
            synchronous: Synchronous::Full,
        }
    }
}

impl StoreConfig {
    /// Configuration for a volatile in-memory store.
    pub fn in_memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Default::default()
        }
    }

    /// Configuration for a SQLite database at `path`.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Open the configured backend and make sure its schema exists.
pub fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn ValueStore>> {
    let store: Arc<dyn ValueStore> = match config.backend {
        StoreBackend::Memory => Arc::new(InMemoryValueStore::new()),
        StoreBackend::Sqlite => Arc::new(SqliteValueStore::open_with(
            &config.path,
            config.busy_timeout(),
            config.synchronous,
        )?),
    };
    store.migrate()?;
    tracing::info!(
        backend = store.backend_name(),
        path = %config.path.display(),
        "value store opened"
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ValueStoreExt;
    use mds_types::MetadataKey;
    use serde_json::json;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.backend, StoreBackend::Sqlite);
        assert_eq!(c.path, PathBuf::from("metadata.db"));
        assert_eq!(c.busy_timeout(), Duration::from_secs(5));
        assert_eq!(c.synchronous, Synchronous::Full);
    }

    #[test]
    fn parse_from_toml() {
        let c: StoreConfig = toml::from_str(
            r#"
            backend = "memory"
            busy_timeout_ms = 250
            synchronous = "normal"
            "#,
        )
        .unwrap();
        assert_eq!(c.backend, StoreBackend::Memory);
        assert_eq!(c.busy_timeout_ms, 250);
        assert_eq!(c.synchronous, Synchronous::Normal);
        assert_eq!(c.path, PathBuf::from("metadata.db"));
    }

    #[test]
    fn open_memory_store() {
        let store = open_store(&StoreConfig::in_memory()).unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[test]
    fn open_sqlite_store_creates_schema() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&StoreConfig::sqlite(dir.path().join("m.db"))).unwrap();
        assert_eq!(store.backend_name(), "sqlite");

        let key = MetadataKey::parse("k").unwrap();
        store.transaction(|tx| tx.insert(&key, &json!({}))).unwrap();
        assert!(store.transaction(|tx| tx.find_for_update(&key)).unwrap().is_some());
    }
}
