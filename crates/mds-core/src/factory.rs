use std::sync::Arc;

use mds_store::{open_store, StoreConfig, ValueStore};

use crate::error::MetadataResult;
use crate::repository::{MetadataRepository, StoreRepository};
use crate::service::MetadataService;

/// Wires a shared value store into repositories and services.
#[derive(Clone)]
pub struct MetadataFactory {
    store: Arc<dyn ValueStore>,
}

impl MetadataFactory {
    pub fn new(store: Arc<dyn ValueStore>) -> Self {
        Self { store }
    }

    /// Open and migrate the configured store.
    pub fn from_config(config: &StoreConfig) -> MetadataResult<Self> {
        Ok(Self::new(open_store(config)?))
    }

    pub fn store(&self) -> &Arc<dyn ValueStore> {
        &self.store
    }

    pub fn create_repository(&self) -> StoreRepository {
        StoreRepository::new(Arc::clone(&self.store))
    }

    pub fn create_service(&self) -> MetadataService {
        let repo: Arc<dyn MetadataRepository> = Arc::new(self.create_repository());
        MetadataService::new(repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn services_share_one_store() {
        let factory = MetadataFactory::from_config(&StoreConfig::in_memory()).unwrap();
        assert_eq!(factory.store().backend_name(), "memory");

        let writer = factory.create_service();
        let reader = factory.create_service();
        writer.create("shared", json!({"a": 1})).unwrap();
        assert_eq!(reader.get("shared").unwrap().my_value, json!({"a": 1}));
    }
}
