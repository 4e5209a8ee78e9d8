// # State Store Trait
//
// Defines the interface for persisting the host's local projection of
// managed resources.
//
// ## Purpose
//
// The remote service owns every rule. The host keeps, per resource address,
// the last [`ResourceData`] a lifecycle operation produced, so the next run
// knows the identifier to read, update or delete.
//
// ## Implementations
//
// - File-based: [`crate::state::FileStateStore`]
// - In-memory: [`crate::state::MemoryStateStore`]

use async_trait::async_trait;

use crate::resource_data::ResourceData;

/// Persisted state of one managed resource
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateRecord {
    /// Resource type name
    pub resource_type: String,
    /// Field storage as of the last successful operation
    pub data: ResourceData,
    /// When the record was last written
    pub last_synced: chrono::DateTime<chrono::Utc>,
}

impl StateRecord {
    /// Create a state record stamped with the current time
    pub fn new(resource_type: impl Into<String>, data: ResourceData) -> Self {
        Self {
            resource_type: resource_type.into(),
            data,
            last_synced: chrono::Utc::now(),
        }
    }
}

/// Trait for state store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Trust Level: Trusted (Core Component)
///
/// - ✅ Perform I/O for persistent storage
/// - ✅ Cache state in memory (with explicit flush)
/// - ❌ Talk to the remote service (owned by `Resource` implementations)
/// - ❌ Decide which lifecycle operation to run (owned by `LifecycleEngine`)
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the state record for a resource address
    ///
    /// # Returns
    ///
    /// - `Ok(Some(StateRecord))`: The stored record
    /// - `Ok(None)`: Nothing stored for this address
    /// - `Err(Error)`: Storage error
    async fn get_record(&self, address: &str) -> Result<Option<StateRecord>, crate::Error>;

    /// Create or replace the state record for a resource address
    async fn set_record(&self, address: &str, record: &StateRecord) -> Result<(), crate::Error>;

    /// Delete a state record
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully deleted (or didn't exist)
    /// - `Err(Error)`: Storage error
    async fn delete_record(&self, address: &str) -> Result<(), crate::Error>;

    /// List all resource addresses in the store
    async fn list_records(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_stamped_now() {
        let before = chrono::Utc::now();
        let record = StateRecord::new("test", ResourceData::new());
        assert_eq!(record.resource_type, "test");
        assert!(record.last_synced >= before);
        assert!(record.last_synced <= chrono::Utc::now());
    }
}
