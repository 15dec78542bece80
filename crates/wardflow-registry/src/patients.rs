//! The patient registry: patient records, bed-assignment pointers and the
//! admission-history audit trail.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wardflow_core::{BedInfo, NewPatient, PatientRecord, PatientStatus, now_utc};
use wardflow_storage::{MemoryStore, RecordStore};

use crate::error::RegistryError;

const KIND: &str = "patient";

type Result<T> = std::result::Result<T, RegistryError>;

/// Owns the patient collection.
///
/// `assign_bed` and `remove_bed` only move the patient-side pointer; they are
/// sub-steps of the coordinator's cross-collection operations and never
/// touch bed records.
#[derive(Clone)]
pub struct PatientRegistry {
    store: Arc<dyn RecordStore<PatientRecord>>,
}

impl PatientRegistry {
    pub fn new(store: Arc<dyn RecordStore<PatientRecord>>) -> Self {
        Self { store }
    }

    /// Registry backed by a fresh in-memory collection.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new("patients")))
    }

    /// Registers a patient. The externally assigned `patient_id` must be
    /// unique. An admitted patient opens their first admission-history entry
    /// here.
    pub async fn create_patient(&self, new: NewPatient) -> Result<PatientRecord> {
        let patient = PatientRecord::from_new(new, now_utc())?;
        self.store
            .insert(patient.clone())
            .await
            .map_err(|e| RegistryError::from_store(KIND, &patient.patient_id, e))?;
        tracing::debug!(
            patient_id = %patient.patient_id,
            status = %patient.status,
            "patient created"
        );
        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<PatientRecord> {
        self.store
            .get(patient_id)
            .await?
            .ok_or_else(|| RegistryError::not_found(KIND, patient_id))
    }

    pub async fn list_patients(&self) -> Result<Vec<PatientRecord>> {
        let mut patients = self.store.scan().await?;
        patients.sort_by(|a, b| a.patient_id.cmp(&b.patient_id));
        Ok(patients)
    }

    /// Patients currently admitted to the given hospital.
    pub async fn patients_by_hospital(&self, hospital_id: &str) -> Result<Vec<PatientRecord>> {
        let mut patients = self.list_patients().await?;
        patients.retain(|p| {
            p.status == PatientStatus::Admitted && p.current_hospital.as_deref() == Some(hospital_id)
        });
        Ok(patients)
    }

    pub async fn patients_in_beds(&self, hospital_id: Option<&str>) -> Result<Vec<PatientRecord>> {
        let mut patients = self.list_patients().await?;
        patients.retain(|p| p.is_in_bed && in_scope(p, hospital_id));
        Ok(patients)
    }

    /// Admitted patients without a bed assignment.
    pub async fn patients_without_beds(
        &self,
        hospital_id: Option<&str>,
    ) -> Result<Vec<PatientRecord>> {
        let mut patients = self.list_patients().await?;
        patients.retain(|p| {
            !p.is_in_bed && p.status == PatientStatus::Admitted && in_scope(p, hospital_id)
        });
        Ok(patients)
    }

    /// Case-insensitive substring search over name and patient id.
    pub async fn search(&self, term: &str) -> Result<Vec<PatientRecord>> {
        let needle = term.to_lowercase();
        let mut patients = self.list_patients().await?;
        patients.retain(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.patient_id.to_lowercase().contains(&needle)
        });
        Ok(patients)
    }

    /// Sets the patient-side half of a bed assignment.
    pub async fn assign_bed(&self, patient_id: &str, info: BedInfo) -> Result<PatientRecord> {
        let mut patient = self.get_patient(patient_id).await?;
        let expected = patient.version;
        patient.set_bed(info);
        self.store
            .put(patient, expected)
            .await
            .map_err(|e| RegistryError::from_store(KIND, patient_id, e))
    }

    /// Clears the patient-side half of a bed assignment.
    pub async fn remove_bed(&self, patient_id: &str) -> Result<PatientRecord> {
        let mut patient = self.get_patient(patient_id).await?;
        let expected = patient.version;
        patient.clear_bed();
        self.store
            .put(patient, expected)
            .await
            .map_err(|e| RegistryError::from_store(KIND, patient_id, e))
    }

    /// Discharges a patient: closes the open admission-history entry with a
    /// discharge timestamp, clears the hospital pointer and any bed fields.
    ///
    /// Discharging an already-discharged patient is reported as a conflict,
    /// never silently ignored.
    pub async fn discharge(&self, patient_id: &str) -> Result<PatientRecord> {
        let mut patient = self.get_patient(patient_id).await?;
        if patient.status == PatientStatus::Discharged {
            return Err(RegistryError::conflict(format!(
                "patient {patient_id} is already discharged"
            )));
        }

        let expected = patient.version;
        let now = now_utc();
        if let Some(entry) = patient.open_admission_mut() {
            entry.close(PatientStatus::Discharged, now);
        }
        patient.status = PatientStatus::Discharged;
        patient.current_hospital = None;
        patient.clear_bed();

        let stored = self
            .store
            .put(patient, expected)
            .await
            .map_err(|e| RegistryError::from_store(KIND, patient_id, e))?;
        tracing::info!(patient_id = %patient_id, "patient discharged");
        Ok(stored)
    }

    /// Transfers a patient to another hospital: closes the open admission
    /// entry as transferred, opens a new entry at the destination and drops
    /// any bed assignment. Re-assignment at the destination is a separate
    /// operation.
    pub async fn transfer_to_hospital(
        &self,
        patient_id: &str,
        new_hospital_id: &str,
    ) -> Result<PatientRecord> {
        let mut patient = self.get_patient(patient_id).await?;
        if patient.status == PatientStatus::Discharged {
            return Err(RegistryError::conflict(format!(
                "patient {patient_id} is discharged and cannot be transferred"
            )));
        }

        let expected = patient.version;
        let now = now_utc();
        if let Some(entry) = patient.open_admission_mut() {
            entry.close(PatientStatus::Transferred, now);
        }
        patient
            .admission_history
            .push(wardflow_core::AdmissionEntry::open(new_hospital_id, None, now));
        patient.current_hospital = Some(new_hospital_id.to_string());
        patient.status = PatientStatus::Admitted;
        patient.clear_bed();

        let stored = self
            .store
            .put(patient, expected)
            .await
            .map_err(|e| RegistryError::from_store(KIND, patient_id, e))?;
        tracing::info!(
            patient_id = %patient_id,
            hospital_id = %new_hospital_id,
            "patient transferred"
        );
        Ok(stored)
    }

    /// Patient counts computed by scanning current state, mirroring the bed
    /// registry's approach.
    pub async fn statistics(&self, hospital_id: Option<&str>) -> Result<PatientStatistics> {
        let patients = self.list_patients().await?;

        let mut stats = PatientStatistics::default();
        for patient in &patients {
            let current_here = match hospital_id {
                Some(h) => patient.current_hospital.as_deref() == Some(h),
                None => true,
            };
            let was_here = match hospital_id {
                Some(h) => patient
                    .admission_history
                    .iter()
                    .any(|e| e.hospital_id == h),
                None => true,
            };

            if current_here {
                stats.total_patients += 1;
                if patient.status == PatientStatus::Admitted {
                    stats.admitted_patients += 1;
                    if patient.is_in_bed {
                        stats.patients_in_beds += 1;
                    } else {
                        stats.patients_without_beds += 1;
                    }
                }
                if let Some(ref info) = patient.bed_info {
                    *stats
                        .department_distribution
                        .entry(info.department.clone())
                        .or_default() += 1;
                }
            }
            if was_here && patient.status == PatientStatus::Discharged {
                stats.discharged_patients += 1;
            }
        }
        Ok(stats)
    }
}

fn in_scope(patient: &PatientRecord, hospital_id: Option<&str>) -> bool {
    match hospital_id {
        Some(h) => patient.current_hospital.as_deref() == Some(h),
        None => true,
    }
}

/// Patient counts for a scope, plus the bed-department distribution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientStatistics {
    pub total_patients: usize,
    pub admitted_patients: usize,
    pub discharged_patients: usize,
    pub patients_in_beds: usize,
    pub patients_without_beds: usize,
    pub department_distribution: BTreeMap<String, usize>,
}
