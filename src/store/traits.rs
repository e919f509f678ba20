//! `SnapshotStore` trait: the key-value seam the wizard persists through.

use async_trait::async_trait;

use crate::error::StorageError;

/// Opaque string key-value storage.
///
/// Two keys are used by the wizard (see
/// [`crate::application::model::snapshot_keys`]); they are written
/// independently with last-write-wins semantics.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read a value, `None` if the key was never written or was removed.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Returns whether it existed.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;
}
