//! The two-step assignment saga: bed first, then patient.

use wardflow_core::{BedInfo, BedRecord, BedStatus, PatientRecord, PatientStatus};
use wardflow_registry::{BedRegistry, PatientRegistry, RegistryError};

use crate::error::CoordinatorError;

/// How many times a lost compare-and-set race is retried from a fresh read
/// before the error is surfaced to the caller.
pub const MAX_CONFLICT_RETRIES: usize = 3;

type Result<T> = std::result::Result<T, CoordinatorError>;

/// Result of a completed assignment.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub bed: BedRecord,
    pub patient: PatientRecord,
}

/// Result of a discharge or transfer: the released bed (when one was held
/// and actually released) and the updated patient.
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub released_bed: Option<BedRecord>,
    pub patient: PatientRecord,
}

/// The only component that touches both registries in one logical
/// operation.
///
/// Step ordering is fixed: the bed is written before the patient, so after
/// any interruption the bed is the authoritative record and the
/// [reconciliation sweep](Self::reconcile) can finish or revert the
/// patient-side half.
#[derive(Clone)]
pub struct AssignmentCoordinator {
    pub(crate) beds: BedRegistry,
    pub(crate) patients: PatientRegistry,
}

impl AssignmentCoordinator {
    pub fn new(beds: BedRegistry, patients: PatientRegistry) -> Self {
        Self { beds, patients }
    }

    pub fn beds(&self) -> &BedRegistry {
        &self.beds
    }

    pub fn patients(&self) -> &PatientRegistry {
        &self.patients
    }

    /// Assigns an admitted, unbedded patient to an available bed.
    ///
    /// The bed-side write happens first and is authoritative. If the
    /// patient-side write cannot complete after bounded retries the error is
    /// a `PartialFailure`: the bed already names the correct patient and the
    /// sweep will finish the assignment.
    pub async fn assign(&self, patient_id: &str, bed_id: &str) -> Result<Assignment> {
        let patient = self.patients.get_patient(patient_id).await?;
        if patient.status != PatientStatus::Admitted {
            return Err(RegistryError::conflict(format!(
                "patient {patient_id} is not admitted (status {})",
                patient.status
            ))
            .into());
        }
        if let Some(current) = patient.assigned_bed_id() {
            return Err(RegistryError::conflict(format!(
                "patient {patient_id} already occupies bed {current}"
            ))
            .into());
        }

        let bed = self.beds.get_bed(bed_id).await?;
        if bed.status != BedStatus::Available {
            return Err(RegistryError::conflict(format!(
                "bed {bed_id} is not available (status {})",
                bed.status
            ))
            .into());
        }

        let bed = self.occupy_bed(bed_id, patient_id).await?;
        let info = BedInfo {
            bed_id: bed.id.clone(),
            bed_number: bed.bed_number.clone(),
            room_number: bed.room_number.clone(),
            department: bed.department.clone(),
            hospital_id: bed.hospital_id.clone(),
        };

        let mut attempts = 0;
        loop {
            match self.patients.assign_bed(patient_id, info.clone()).await {
                Ok(patient) => {
                    tracing::info!(
                        patient_id = %patient_id,
                        bed_id = %bed.id,
                        "patient assigned to bed"
                    );
                    return Ok(Assignment { bed, patient });
                }
                Err(e) if e.is_version_conflict() && attempts < MAX_CONFLICT_RETRIES => {
                    attempts += 1;
                    tracing::debug!(
                        patient_id = %patient_id,
                        attempts,
                        "retrying patient-side assignment after version conflict"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        patient_id = %patient_id,
                        bed_id = %bed.id,
                        error = %e,
                        "bed occupied but patient-side assignment failed; reconciliation required"
                    );
                    return Err(CoordinatorError::partial_failure(
                        "assign", bed.id.clone(), patient_id, e,
                    ));
                }
            }
        }
    }

    /// Discharges a patient who holds a bed: releases the bed first, then
    /// closes the admission.
    ///
    /// A patient without a bed is `NotAssigned`; discharge without a bed
    /// goes through the patient registry directly.
    pub async fn discharge(&self, patient_id: &str) -> Result<ReleaseOutcome> {
        let patient = self.patients.get_patient(patient_id).await?;
        let Some(bed_id) = patient.assigned_bed_id().map(str::to_string) else {
            return Err(CoordinatorError::not_assigned(patient_id));
        };

        let released = self.release_bed(&bed_id, patient_id).await?;
        let bed_touched = released.is_some();

        let mut attempts = 0;
        let patient = loop {
            match self.patients.discharge(patient_id).await {
                Ok(patient) => break patient,
                Err(e) if e.is_version_conflict() && attempts < MAX_CONFLICT_RETRIES => {
                    attempts += 1;
                }
                Err(e) if bed_touched => {
                    tracing::error!(
                        patient_id = %patient_id,
                        bed_id = %bed_id,
                        error = %e,
                        "bed released but patient discharge failed; reconciliation required"
                    );
                    return Err(CoordinatorError::partial_failure(
                        "discharge", bed_id, patient_id, e,
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        };

        Ok(ReleaseOutcome {
            released_bed: released,
            patient,
        })
    }

    /// Transfers a patient to another hospital, releasing their bed first
    /// when they hold one.
    pub async fn transfer(&self, patient_id: &str, new_hospital_id: &str) -> Result<ReleaseOutcome> {
        let patient = self.patients.get_patient(patient_id).await?;

        let released = match patient.assigned_bed_id().map(str::to_string) {
            Some(bed_id) => self.release_bed(&bed_id, patient_id).await?,
            None => None,
        };
        let bed_touched = released.is_some();

        let mut attempts = 0;
        let patient = loop {
            match self
                .patients
                .transfer_to_hospital(patient_id, new_hospital_id)
                .await
            {
                Ok(patient) => break patient,
                Err(e) if e.is_version_conflict() && attempts < MAX_CONFLICT_RETRIES => {
                    attempts += 1;
                }
                Err(e) if bed_touched => {
                    let bed_id = released
                        .as_ref()
                        .map(|b| b.id.clone())
                        .unwrap_or_default();
                    tracing::error!(
                        patient_id = %patient_id,
                        bed_id = %bed_id,
                        error = %e,
                        "bed released but patient transfer failed; reconciliation required"
                    );
                    return Err(CoordinatorError::partial_failure(
                        "transfer", bed_id, patient_id, e,
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            patient_id = %patient_id,
            hospital_id = %new_hospital_id,
            released_bed = released.as_ref().map(|b| b.id.as_str()).unwrap_or("-"),
            "patient transferred"
        );
        Ok(ReleaseOutcome {
            released_bed: released,
            patient,
        })
    }

    async fn occupy_bed(&self, bed_id: &str, patient_id: &str) -> Result<BedRecord> {
        let mut attempts = 0;
        loop {
            match self
                .beds
                .update_status(bed_id, BedStatus::Occupied, Some(patient_id))
                .await
            {
                Ok(bed) => return Ok(bed),
                Err(e) if e.is_version_conflict() && attempts < MAX_CONFLICT_RETRIES => {
                    attempts += 1;
                    tracing::debug!(
                        bed_id = %bed_id,
                        attempts,
                        "retrying bed occupancy after version conflict"
                    );
                }
                Err(RegistryError::InvalidTransition { from, .. }) => {
                    // Another writer took the bed between the availability
                    // check and this write.
                    return Err(RegistryError::conflict(format!(
                        "bed {bed_id} is not available (status {from})"
                    ))
                    .into());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Releases the bed half of a discharge/transfer.
    ///
    /// The bed is the source of truth: when it is missing, not occupied, or
    /// occupied by a different patient, the patient's claim is stale drift
    /// and the release is treated as already done.
    pub(crate) async fn release_bed(
        &self,
        bed_id: &str,
        patient_id: &str,
    ) -> Result<Option<BedRecord>> {
        let mut attempts = 0;
        loop {
            let bed = match self.beds.get_bed(bed_id).await {
                Ok(bed) => bed,
                Err(e) if e.is_not_found() => {
                    tracing::warn!(
                        bed_id = %bed_id,
                        patient_id = %patient_id,
                        "patient references a missing bed; treating as released"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            if bed.status != BedStatus::Occupied
                || bed.patient_id.as_deref() != Some(patient_id)
            {
                tracing::warn!(
                    bed_id = %bed_id,
                    patient_id = %patient_id,
                    bed_status = %bed.status,
                    bed_patient = bed.patient_id.as_deref().unwrap_or("-"),
                    "bed does not hold this patient; treating as released"
                );
                return Ok(None);
            }

            match self
                .beds
                .update_status(bed_id, BedStatus::Available, None)
                .await
            {
                Ok(bed) => return Ok(Some(bed)),
                Err(e) if e.is_version_conflict() && attempts < MAX_CONFLICT_RETRIES => {
                    attempts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardflow_core::{NewBed, NewPatient};

    fn coordinator() -> AssignmentCoordinator {
        AssignmentCoordinator::new(BedRegistry::in_memory(), PatientRegistry::in_memory())
    }

    async fn seed_bed(c: &AssignmentCoordinator, number: &str) -> BedRecord {
        c.beds()
            .create_bed(NewBed {
                hospital_id: "H1".into(),
                bed_number: number.into(),
                room_number: "101".into(),
                department: "ICU".into(),
                bed_type: Default::default(),
                floor: 1,
                wing: "Main".into(),
            })
            .await
            .unwrap()
    }

    async fn seed_patient(c: &AssignmentCoordinator, id: &str) -> PatientRecord {
        c.patients()
            .create_patient(NewPatient {
                patient_id: id.into(),
                name: format!("Patient {id}"),
                age: None,
                gender: None,
                phone: None,
                status: PatientStatus::Admitted,
                current_hospital: Some("H1".into()),
                admission_reason: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_assign_requires_available_bed() {
        let c = coordinator();
        let bed = seed_bed(&c, "B001").await;
        seed_patient(&c, "PT1").await;
        seed_patient(&c, "PT2").await;

        c.assign("PT1", &bed.id).await.unwrap();

        let err = c.assign("PT2", &bed.id).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_assign_requires_admitted_unbedded_patient() {
        let c = coordinator();
        let bed1 = seed_bed(&c, "B001").await;
        let bed2 = seed_bed(&c, "B002").await;
        seed_patient(&c, "PT1").await;

        c.assign("PT1", &bed1.id).await.unwrap();
        let err = c.assign("PT1", &bed2.id).await.unwrap_err();
        assert!(err.is_conflict());

        seed_patient(&c, "PT2").await;
        c.patients().discharge("PT2").await.unwrap();
        let err = c.assign("PT2", &bed2.id).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_assign_missing_records() {
        let c = coordinator();
        let bed = seed_bed(&c, "B001").await;
        seed_patient(&c, "PT1").await;

        assert!(c.assign("ghost", &bed.id).await.unwrap_err().is_not_found());
        assert!(c.assign("PT1", "ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_discharge_without_bed_is_not_assigned() {
        let c = coordinator();
        seed_patient(&c, "PT1").await;

        let err = c.discharge("PT1").await.unwrap_err();
        assert!(err.is_not_assigned());
    }

    #[tokio::test]
    async fn test_release_tolerates_stale_claim() {
        let c = coordinator();
        let bed = seed_bed(&c, "B001").await;
        seed_patient(&c, "PT1").await;

        // The patient claims a bed the bed registry never granted.
        c.patients()
            .assign_bed(
                "PT1",
                BedInfo {
                    bed_id: bed.id.clone(),
                    bed_number: bed.bed_number.clone(),
                    room_number: bed.room_number.clone(),
                    department: bed.department.clone(),
                    hospital_id: bed.hospital_id.clone(),
                },
            )
            .await
            .unwrap();

        // Discharge proceeds anyway: the bed side is authoritative.
        let outcome = c.discharge("PT1").await.unwrap();
        assert!(outcome.released_bed.is_none());
        assert_eq!(outcome.patient.status, PatientStatus::Discharged);

        let bed = c.beds().get_bed(&bed.id).await.unwrap();
        assert_eq!(bed.status, BedStatus::Available);
    }

    #[tokio::test]
    async fn test_transfer_without_bed() {
        let c = coordinator();
        seed_patient(&c, "PT1").await;

        let outcome = c.transfer("PT1", "H2").await.unwrap();
        assert!(outcome.released_bed.is_none());
        assert_eq!(outcome.patient.current_hospital.as_deref(), Some("H2"));
    }
}
