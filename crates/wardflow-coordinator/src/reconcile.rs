//! The reconciliation sweep: detects and repairs drift between bed and
//! patient cross-pointers left behind by a partially completed operation.

use std::collections::HashMap;

use serde::Serialize;
use wardflow_core::{BedInfo, BedRecord, BedStatus, PatientRecord, PatientStatus};

use crate::coordinator::AssignmentCoordinator;
use crate::error::CoordinatorError;

type Result<T> = std::result::Result<T, CoordinatorError>;

/// What a sweep looked at and what it changed.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub beds_examined: usize,
    pub patients_examined: usize,
    pub repairs: Vec<RepairAction>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
    }
}

/// A single repair applied by the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepairAction {
    /// The bed named an admitted, unbedded patient: the interrupted
    /// assignment was finished on the patient side.
    CompletedAssignment { bed_id: String, patient_id: String },
    /// The bed's occupant was missing, discharged, or claiming a different
    /// bed: the bed was reverted to available.
    RevertedBed {
        bed_id: String,
        patient_id: Option<String>,
    },
    /// The patient claimed a bed that does not hold them: the patient's bed
    /// fields were cleared.
    ClearedPatientBed { patient_id: String, bed_id: String },
}

impl AssignmentCoordinator {
    /// Compares bed `patient_id` pointers against patient `bed_info`
    /// pointers and repairs any drift, bed side first (the bed is the
    /// authoritative record).
    ///
    /// Records that move concurrently with the sweep are skipped with a
    /// warning; the next sweep picks them up.
    pub async fn reconcile(&self, hospital_id: Option<&str>) -> Result<ReconciliationReport> {
        let beds = self.beds.list_beds(hospital_id).await?;
        let patients = self.patients.list_patients().await?;
        let patients_by_id: HashMap<&str, &PatientRecord> = patients
            .iter()
            .map(|p| (p.patient_id.as_str(), p))
            .collect();

        let mut repairs = Vec::new();

        for bed in &beds {
            if bed.status != BedStatus::Occupied {
                continue;
            }
            match bed.patient_id.as_deref() {
                None => {
                    // Occupied with no occupant on record.
                    if self.revert_bed(&bed.id).await? {
                        repairs.push(RepairAction::RevertedBed {
                            bed_id: bed.id.clone(),
                            patient_id: None,
                        });
                    }
                }
                Some(pid) => match patients_by_id.get(pid) {
                    Some(p)
                        if p.status == PatientStatus::Admitted
                            && p.assigned_bed_id() == Some(bed.id.as_str()) =>
                    {
                        // Consistent.
                    }
                    Some(p)
                        if p.status == PatientStatus::Admitted
                            && p.assigned_bed_id().is_none() =>
                    {
                        // The bed already names the correct patient; finish
                        // the interrupted assignment.
                        if self.complete_assignment(bed, pid).await? {
                            repairs.push(RepairAction::CompletedAssignment {
                                bed_id: bed.id.clone(),
                                patient_id: pid.to_string(),
                            });
                        }
                    }
                    _ => {
                        // Missing, discharged, or claiming a different bed.
                        if self.revert_bed(&bed.id).await? {
                            repairs.push(RepairAction::RevertedBed {
                                bed_id: bed.id.clone(),
                                patient_id: Some(pid.to_string()),
                            });
                        }
                    }
                },
            }
        }

        for patient in &patients {
            let Some(info) = patient.bed_info.as_ref() else {
                continue;
            };
            if let Some(h) = hospital_id
                && info.hospital_id != h
            {
                continue;
            }

            let holds = match self.beds.get_bed(&info.bed_id).await {
                Ok(bed) => {
                    bed.status == BedStatus::Occupied
                        && bed.patient_id.as_deref() == Some(patient.patient_id.as_str())
                }
                Err(e) if e.is_not_found() => false,
                Err(e) => return Err(e.into()),
            };
            if holds {
                continue;
            }

            match self.patients.remove_bed(&patient.patient_id).await {
                Ok(_) => repairs.push(RepairAction::ClearedPatientBed {
                    patient_id: patient.patient_id.clone(),
                    bed_id: info.bed_id.clone(),
                }),
                Err(e) if e.is_version_conflict() || e.is_not_found() => {
                    tracing::warn!(
                        patient_id = %patient.patient_id,
                        error = %e,
                        "skipping patient repair after concurrent update"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let report = ReconciliationReport {
            beds_examined: beds.len(),
            patients_examined: patients.len(),
            repairs,
        };
        if report.is_clean() {
            tracing::debug!(
                beds = report.beds_examined,
                patients = report.patients_examined,
                "reconciliation sweep found no drift"
            );
        } else {
            tracing::warn!(
                beds = report.beds_examined,
                patients = report.patients_examined,
                repairs = report.repairs.len(),
                "reconciliation sweep repaired drift"
            );
        }
        Ok(report)
    }

    async fn revert_bed(&self, bed_id: &str) -> Result<bool> {
        match self
            .beds
            .update_status(bed_id, BedStatus::Available, None)
            .await
        {
            Ok(_) => Ok(true),
            Err(e)
                if e.is_version_conflict() || e.is_invalid_transition() || e.is_not_found() =>
            {
                tracing::warn!(
                    bed_id = %bed_id,
                    error = %e,
                    "skipping bed repair after concurrent update"
                );
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn complete_assignment(&self, bed: &BedRecord, patient_id: &str) -> Result<bool> {
        let info = BedInfo {
            bed_id: bed.id.clone(),
            bed_number: bed.bed_number.clone(),
            room_number: bed.room_number.clone(),
            department: bed.department.clone(),
            hospital_id: bed.hospital_id.clone(),
        };
        match self.patients.assign_bed(patient_id, info).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_version_conflict() || e.is_not_found() => {
                tracing::warn!(
                    patient_id = %patient_id,
                    bed_id = %bed.id,
                    error = %e,
                    "skipping assignment completion after concurrent update"
                );
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}
