//! In-memory record store backend.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use wardflow_core::{Record, now_utc};

use crate::error::StorageError;
use crate::traits::RecordStore;

/// In-memory store keyed on a concurrent hash map.
///
/// The map's per-key entry locking makes the version check and the write a
/// single atomic step, which is what the compare-and-set contract requires.
/// Unrelated keys never contend.
#[derive(Debug)]
pub struct MemoryStore<R> {
    collection: &'static str,
    data: DashMap<String, R>,
}

impl<R> MemoryStore<R>
where
    R: Record + Clone + Send + Sync + 'static,
{
    /// Creates an empty store for the named collection.
    pub fn new(collection: &'static str) -> Self {
        Self {
            collection,
            data: DashMap::new(),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl<R> RecordStore<R> for MemoryStore<R>
where
    R: Record + Clone + Send + Sync + 'static,
{
    async fn get(&self, id: &str) -> Result<Option<R>, StorageError> {
        Ok(self.data.get(id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, record: R) -> Result<(), StorageError> {
        match self.data.entry(record.key().to_string()) {
            Entry::Occupied(_) => Err(StorageError::already_exists(self.collection, record.key())),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn put(&self, mut record: R, expected_version: u64) -> Result<R, StorageError> {
        match self.data.entry(record.key().to_string()) {
            Entry::Occupied(mut slot) => {
                let actual = slot.get().version();
                if actual != expected_version {
                    return Err(StorageError::version_conflict(expected_version, actual));
                }
                record.bump_version(now_utc());
                slot.insert(record.clone());
                Ok(record)
            }
            Entry::Vacant(_) => Err(StorageError::not_found(self.collection, record.key())),
        }
    }

    async fn remove(&self, id: &str, expected_version: u64) -> Result<R, StorageError> {
        match self.data.entry(id.to_string()) {
            Entry::Occupied(slot) => {
                let actual = slot.get().version();
                if actual != expected_version {
                    return Err(StorageError::version_conflict(expected_version, actual));
                }
                Ok(slot.remove())
            }
            Entry::Vacant(_) => Err(StorageError::not_found(self.collection, id)),
        }
    }

    async fn scan(&self) -> Result<Vec<R>, StorageError> {
        Ok(self
            .data
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn collection(&self) -> &'static str {
        self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wardflow_core::{BedRecord, BedStatus, NewBed};

    fn sample_bed(id: &str) -> BedRecord {
        let new = NewBed {
            hospital_id: "H1".into(),
            bed_number: format!("B-{id}"),
            room_number: "101".into(),
            department: "ICU".into(),
            bed_type: Default::default(),
            floor: 1,
            wing: "Main".into(),
        };
        BedRecord::from_new(id.to_string(), new, now_utc())
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new("beds");
        store.insert(sample_bed("bed-1")).await.unwrap();

        let bed = store.get("bed-1").await.unwrap().unwrap();
        assert_eq!(bed.id, "bed-1");
        assert_eq!(bed.version, 0);

        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate() {
        let store = MemoryStore::new("beds");
        store.insert(sample_bed("bed-1")).await.unwrap();

        let err = store.insert(sample_bed("bed-1")).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_put_bumps_version() {
        let store = MemoryStore::new("beds");
        store.insert(sample_bed("bed-1")).await.unwrap();

        let mut bed = store.get("bed-1").await.unwrap().unwrap();
        bed.status = BedStatus::Maintenance;
        let stored = store.put(bed, 0).await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.status, BedStatus::Maintenance);

        let read_back = store.get("bed-1").await.unwrap().unwrap();
        assert_eq!(read_back.version, 1);
    }

    #[tokio::test]
    async fn test_put_version_conflict() {
        let store = MemoryStore::new("beds");
        store.insert(sample_bed("bed-1")).await.unwrap();

        let bed = store.get("bed-1").await.unwrap().unwrap();
        store.put(bed.clone(), 0).await.unwrap();

        // Second write from the same stale read must fail.
        let err = store.put(bed, 0).await.unwrap_err();
        assert!(err.is_version_conflict());
    }

    #[tokio::test]
    async fn test_put_missing_record() {
        let store = MemoryStore::new("beds");
        let err = store.put(sample_bed("ghost"), 0).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_remove_checks_version() {
        let store = MemoryStore::new("beds");
        store.insert(sample_bed("bed-1")).await.unwrap();

        let err = store.remove("bed-1", 7).await.unwrap_err();
        assert!(err.is_version_conflict());

        let removed = store.remove("bed-1", 0).await.unwrap();
        assert_eq!(removed.id, "bed-1");
        assert!(store.get("bed-1").await.unwrap().is_none());

        let err = store.remove("bed-1", 0).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_scan_snapshot() {
        let store = MemoryStore::new("beds");
        for i in 0..4 {
            store.insert(sample_bed(&format!("bed-{i}"))).await.unwrap();
        }

        let all = store.scan().await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_cas_single_winner() {
        let store = Arc::new(MemoryStore::new("beds"));
        store.insert(sample_bed("bed-1")).await.unwrap();

        let bed = store.get("bed-1").await.unwrap().unwrap();
        let mut first = bed.clone();
        first.status = BedStatus::Occupied;
        first.patient_id = Some("PT1".into());
        let mut second = bed;
        second.status = BedStatus::Occupied;
        second.patient_id = Some("PT2".into());

        let (a, b) = tokio::join!(
            store.put(first, 0),
            store.put(second, 0),
        );

        // Exactly one compare-and-set wins from the same read.
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

        let stored = store.get("bed-1").await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert!(stored.patient_id.is_some());
    }
}
