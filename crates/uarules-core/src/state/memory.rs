// # Memory State Store
//
// In-memory implementation of StateStore. State is lost on exit, so the next
// run treats every resource as not yet created. Useful for tests and
// one-shot runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{StateRecord, StateStore};

/// In-memory state store implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    inner: Arc<RwLock<HashMap<String, StateRecord>>>,
}

impl MemoryStateStore {
    /// Create a new empty memory state store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of records in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_record(&self, address: &str) -> Result<Option<StateRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(address).cloned())
    }

    async fn set_record(&self, address: &str, record: &StateRecord) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(address.to_string(), record.clone());
        Ok(())
    }

    async fn delete_record(&self, address: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(address);
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        let mut addresses: Vec<String> = guard.keys().cloned().collect();
        addresses.sort();
        Ok(addresses)
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_data::ResourceData;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStateStore::new();
        assert!(store.is_empty().await);

        let mut data = ResourceData::new();
        data.set_id("rule-1");
        let record = StateRecord::new("test", data);

        store.set_record("test.main", &record).await.unwrap();
        assert_eq!(store.len().await, 1);

        let retrieved = store.get_record("test.main").await.unwrap().unwrap();
        assert_eq!(retrieved.data.id(), Some("rule-1"));

        store.delete_record("test.main").await.unwrap();
        assert!(store.get_record("test.main").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_list_sorted() {
        let store = MemoryStateStore::new();
        let record = StateRecord::new("test", ResourceData::new());

        store.set_record("b", &record).await.unwrap();
        store.set_record("a", &record).await.unwrap();

        assert_eq!(store.list_records().await.unwrap(), vec!["a", "b"]);
    }
}
