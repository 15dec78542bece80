//! Storage traits for the record-store abstraction layer.

use async_trait::async_trait;
use wardflow_core::Record;

use crate::error::StorageError;

/// A keyed collection of versioned records.
///
/// Implementations must be thread-safe (`Send + Sync`). Writes are
/// compare-and-set: `put` and `remove` take the version the caller read and
/// fail with [`StorageError::VersionConflict`] when another writer got there
/// first. The caller retries from a fresh read.
///
/// # Example
///
/// ```ignore
/// use wardflow_storage::{RecordStore, StorageError};
///
/// async fn release(store: &dyn RecordStore<BedRecord>, id: &str) -> Result<(), StorageError> {
///     let mut bed = store
///         .get(id)
///         .await?
///         .ok_or_else(|| StorageError::not_found("beds", id))?;
///     let expected = bed.version;
///     bed.patient_id = None;
///     store.put(bed, expected).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RecordStore<R>: Send + Sync
where
    R: Record + Clone + Send + Sync + 'static,
{
    /// Reads a record by id.
    ///
    /// Returns `None` if the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing
    /// records.
    async fn get(&self, id: &str) -> Result<Option<R>, StorageError>;

    /// Creates a new record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if a record with the same key
    /// exists.
    async fn insert(&self, record: R) -> Result<(), StorageError>;

    /// Replaces an existing record if its stored version still matches
    /// `expected_version`.
    ///
    /// On success the stored copy carries `expected_version + 1` and a fresh
    /// update timestamp; that copy is returned.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    /// Returns `StorageError::VersionConflict` if the stored version moved.
    async fn put(&self, record: R, expected_version: u64) -> Result<R, StorageError>;

    /// Removes a record if its stored version still matches
    /// `expected_version`. Returns the removed record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the record does not exist.
    /// Returns `StorageError::VersionConflict` if the stored version moved.
    async fn remove(&self, id: &str, expected_version: u64) -> Result<R, StorageError>;

    /// Returns a snapshot of every record in the collection.
    ///
    /// Statistics and the reconciliation sweep scan; the collections are
    /// read-mostly and hospital-scale small, so no index is maintained.
    async fn scan(&self) -> Result<Vec<R>, StorageError>;

    /// Name of the collection, for error messages and logging.
    fn collection(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardflow_core::BedRecord;

    // Compile-time check that RecordStore is object-safe
    fn _assert_store_object_safe(_: &dyn RecordStore<BedRecord>) {}
}
