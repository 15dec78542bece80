//! The bed registry: bed records and their status transitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wardflow_core::{BedDetailsUpdate, BedRecord, BedStatus, NewBed, generate_id, now_utc};
use wardflow_storage::{MemoryStore, RecordStore};

use crate::error::RegistryError;

const KIND: &str = "bed";

type Result<T> = std::result::Result<T, RegistryError>;

/// Owns the bed collection and enforces the occupancy transition table.
///
/// The only operation that may change `status` or the patient pointer is
/// [`BedRegistry::update_status`]; everything else treats them as read-only.
#[derive(Clone)]
pub struct BedRegistry {
    store: Arc<dyn RecordStore<BedRecord>>,
}

impl BedRegistry {
    pub fn new(store: Arc<dyn RecordStore<BedRecord>>) -> Self {
        Self { store }
    }

    /// Registry backed by a fresh in-memory collection.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new("beds")))
    }

    /// Creates a bed. `bed_number`, `room_number` and `department` are
    /// required; the bed starts available with no patient.
    ///
    /// Duplicate bed numbers within a hospital are allowed but logged as a
    /// data-quality warning.
    pub async fn create_bed(&self, new: NewBed) -> Result<BedRecord> {
        new.validate()?;

        let duplicates = self
            .store
            .scan()
            .await?
            .into_iter()
            .filter(|b| b.hospital_id == new.hospital_id && b.bed_number == new.bed_number)
            .count();
        if duplicates > 0 {
            tracing::warn!(
                hospital_id = %new.hospital_id,
                bed_number = %new.bed_number,
                duplicates,
                "bed number already in use within hospital"
            );
        }

        let bed = BedRecord::from_new(generate_id(), new, now_utc());
        self.store
            .insert(bed.clone())
            .await
            .map_err(|e| RegistryError::from_store(KIND, &bed.id, e))?;
        tracing::debug!(bed_id = %bed.id, department = %bed.department, "bed created");
        Ok(bed)
    }

    pub async fn get_bed(&self, bed_id: &str) -> Result<BedRecord> {
        self.store
            .get(bed_id)
            .await?
            .ok_or_else(|| RegistryError::not_found(KIND, bed_id))
    }

    /// All beds, optionally scoped to one hospital.
    pub async fn list_beds(&self, hospital_id: Option<&str>) -> Result<Vec<BedRecord>> {
        let mut beds = self.store.scan().await?;
        if let Some(h) = hospital_id {
            beds.retain(|b| b.hospital_id == h);
        }
        beds.sort_by(|a, b| a.bed_number.cmp(&b.bed_number));
        Ok(beds)
    }

    pub async fn beds_by_status(
        &self,
        status: BedStatus,
        hospital_id: Option<&str>,
    ) -> Result<Vec<BedRecord>> {
        let mut beds = self.list_beds(hospital_id).await?;
        beds.retain(|b| b.status == status);
        Ok(beds)
    }

    pub async fn beds_by_department(
        &self,
        hospital_id: &str,
        department: &str,
    ) -> Result<Vec<BedRecord>> {
        let mut beds = self.list_beds(Some(hospital_id)).await?;
        beds.retain(|b| b.department == department);
        Ok(beds)
    }

    /// Sorted distinct departments that have beds in the hospital.
    pub async fn departments(&self, hospital_id: &str) -> Result<Vec<String>> {
        let beds = self.list_beds(Some(hospital_id)).await?;
        let mut departments: Vec<String> = beds.into_iter().map(|b| b.department).collect();
        departments.sort();
        departments.dedup();
        Ok(departments)
    }

    /// Applies a status transition with compare-and-set semantics.
    ///
    /// The transition table:
    /// - `available -> occupied` requires a patient id and sets the pointer
    /// - `occupied -> available` clears the pointer
    /// - `* -> maintenance` clears the pointer unconditionally
    /// - `maintenance -> available` requires the pointer to be clear
    ///
    /// Anything else is an invalid transition. A lost write race surfaces as
    /// a version conflict the caller retries from a fresh read.
    pub async fn update_status(
        &self,
        bed_id: &str,
        new_status: BedStatus,
        patient_id: Option<&str>,
    ) -> Result<BedRecord> {
        let mut bed = self.get_bed(bed_id).await?;
        let expected = bed.version;
        let from = bed.status;

        apply_transition(&mut bed, new_status, patient_id)?;

        let stored = self
            .store
            .put(bed, expected)
            .await
            .map_err(|e| RegistryError::from_store(KIND, bed_id, e))?;
        tracing::info!(
            bed_id = %bed_id,
            from = %from,
            to = %new_status,
            patient_id = stored.patient_id.as_deref().unwrap_or("-"),
            "bed status updated"
        );
        Ok(stored)
    }

    /// Updates the descriptive fields of a bed. Status and patient pointer
    /// changes must go through [`BedRegistry::update_status`].
    pub async fn update_details(
        &self,
        bed_id: &str,
        update: &BedDetailsUpdate,
    ) -> Result<BedRecord> {
        if update.is_empty() {
            return Err(RegistryError::validation("no updatable bed fields provided"));
        }

        let mut bed = self.get_bed(bed_id).await?;
        let expected = bed.version;
        bed.apply_details(update);

        self.store
            .put(bed, expected)
            .await
            .map_err(|e| RegistryError::from_store(KIND, bed_id, e))
    }

    /// Deletes a bed. Refused while the bed is occupied.
    pub async fn delete_bed(&self, bed_id: &str) -> Result<BedRecord> {
        let bed = self.get_bed(bed_id).await?;
        if bed.is_occupied() {
            return Err(RegistryError::conflict(format!(
                "bed {bed_id} is occupied and cannot be deleted"
            )));
        }

        let removed = self
            .store
            .remove(bed_id, bed.version)
            .await
            .map_err(|e| RegistryError::from_store(KIND, bed_id, e))?;
        tracing::info!(bed_id = %bed_id, "bed deleted");
        Ok(removed)
    }

    /// Occupancy counts computed by scanning current bed state. The
    /// collections are read-mostly and hospital-scale small; switch to
    /// transactionally maintained counters before scaling past a few
    /// thousand beds per hospital.
    pub async fn statistics(&self, hospital_id: Option<&str>) -> Result<BedStatistics> {
        let beds = self.list_beds(hospital_id).await?;

        let mut stats = BedStatistics {
            total_beds: beds.len(),
            ..Default::default()
        };
        for bed in &beds {
            match bed.status {
                BedStatus::Available => stats.available_beds += 1,
                BedStatus::Occupied => stats.occupied_beds += 1,
                BedStatus::Maintenance => stats.maintenance_beds += 1,
            }
            let dept = stats
                .department_stats
                .entry(bed.department.clone())
                .or_default();
            dept.total += 1;
            match bed.status {
                BedStatus::Available => dept.available += 1,
                BedStatus::Occupied => dept.occupied += 1,
                BedStatus::Maintenance => {}
            }
        }
        stats.occupancy_rate = if stats.total_beds > 0 {
            let pct = stats.occupied_beds as f64 / stats.total_beds as f64 * 100.0;
            (pct * 100.0).round() / 100.0
        } else {
            0.0
        };
        Ok(stats)
    }
}

fn apply_transition(
    bed: &mut BedRecord,
    to: BedStatus,
    patient_id: Option<&str>,
) -> Result<()> {
    use BedStatus::{Available, Maintenance, Occupied};

    match (bed.status, to) {
        (Available, Occupied) => {
            let pid = patient_id.ok_or_else(|| {
                RegistryError::validation("occupying a bed requires a patient_id")
            })?;
            bed.patient_id = Some(pid.to_string());
        }
        (Occupied, Available) => {
            bed.patient_id = None;
        }
        // A bed under maintenance cannot hold a patient.
        (_, Maintenance) => {
            bed.patient_id = None;
        }
        (Maintenance, Available) => {
            if let Some(ref pid) = bed.patient_id {
                return Err(RegistryError::conflict(format!(
                    "bed {} still references patient {pid}",
                    bed.id
                )));
            }
        }
        (from, to) => return Err(RegistryError::invalid_transition(from, to)),
    }
    bed.status = to;
    Ok(())
}

/// Occupancy counts for a scope, plus the per-department breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BedStatistics {
    pub total_beds: usize,
    pub available_beds: usize,
    pub occupied_beds: usize,
    pub maintenance_beds: usize,
    /// Occupied share of all beds, as a percentage rounded to two decimals.
    pub occupancy_rate: f64,
    pub department_stats: BTreeMap<String, DepartmentBedStats>,
}

impl BedStatistics {
    /// Occupied share of all beds as a ratio in `[0, 1]`, unrounded.
    pub fn occupancy_ratio(&self) -> f64 {
        if self.total_beds == 0 {
            0.0
        } else {
            self.occupied_beds as f64 / self.total_beds as f64
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepartmentBedStats {
    pub total: usize,
    pub available: usize,
    pub occupied: usize,
}
