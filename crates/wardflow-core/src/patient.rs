use crate::Record;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Lifecycle state of a patient (and of a single admission-history entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    #[default]
    Admitted,
    Discharged,
    Transferred,
}

impl PatientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::Discharged => "discharged",
            Self::Transferred => "transferred",
        }
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatientStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admitted" => Ok(Self::Admitted),
            "discharged" => Ok(Self::Discharged),
            "transferred" => Ok(Self::Transferred),
            other => Err(CoreError::invalid_status(other)),
        }
    }
}

/// Denormalized snapshot of the bed a patient occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedInfo {
    pub bed_id: String,
    pub bed_number: String,
    pub room_number: String,
    pub department: String,
    pub hospital_id: String,
}

/// One stay at one hospital. Open while `discharge_date` is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionEntry {
    pub hospital_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub admission_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub discharge_date: Option<OffsetDateTime>,
    pub status: PatientStatus,
    pub reason: Option<String>,
}

impl AdmissionEntry {
    /// Opens a new admission at the given hospital.
    pub fn open(hospital_id: impl Into<String>, reason: Option<String>, now: OffsetDateTime) -> Self {
        Self {
            hospital_id: hospital_id.into(),
            admission_date: now,
            discharge_date: None,
            status: PatientStatus::Admitted,
            reason,
        }
    }

    pub fn is_open(&self) -> bool {
        self.discharge_date.is_none()
    }

    /// Closes the entry with the given terminal status.
    pub fn close(&mut self, status: PatientStatus, now: OffsetDateTime) {
        self.discharge_date = Some(now);
        self.status = status;
    }
}

/// Input payload for registering a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub patient_id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u16>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: PatientStatus,
    #[serde(default)]
    pub current_hospital: Option<String>,
    #[serde(default)]
    pub admission_reason: Option<String>,
}

/// A patient with their bed-assignment pointer and admission audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub name: String,
    pub age: Option<u16>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub status: PatientStatus,
    pub is_in_bed: bool,
    pub bed_info: Option<BedInfo>,
    pub current_hospital: Option<String>,
    pub admission_history: Vec<AdmissionEntry>,
    pub version: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PatientRecord {
    /// Builds a fresh record from a creation payload.
    ///
    /// An admitted patient needs a hospital: the open admission-history
    /// entry is created here, and the current-hospital pointer must always
    /// name the hospital of that open entry.
    pub fn from_new(new: NewPatient, now: OffsetDateTime) -> Result<Self> {
        if new.patient_id.trim().is_empty() {
            return Err(CoreError::validation("patient_id is required"));
        }
        if new.name.trim().is_empty() {
            return Err(CoreError::validation("name is required"));
        }

        let mut admission_history = Vec::new();
        let current_hospital = match new.status {
            PatientStatus::Admitted => {
                let hospital = new.current_hospital.ok_or_else(|| {
                    CoreError::validation("an admitted patient requires current_hospital")
                })?;
                admission_history.push(AdmissionEntry::open(
                    hospital.clone(),
                    new.admission_reason,
                    now,
                ));
                Some(hospital)
            }
            PatientStatus::Discharged | PatientStatus::Transferred => None,
        };

        Ok(Self {
            patient_id: new.patient_id,
            name: new.name,
            age: new.age,
            gender: new.gender,
            phone: new.phone,
            status: new.status,
            is_in_bed: false,
            bed_info: None,
            current_hospital,
            admission_history,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// The open admission-history entry, if any.
    pub fn open_admission(&self) -> Option<&AdmissionEntry> {
        self.admission_history.iter().rev().find(|e| e.is_open())
    }

    pub fn open_admission_mut(&mut self) -> Option<&mut AdmissionEntry> {
        self.admission_history.iter_mut().rev().find(|e| e.is_open())
    }

    /// The bed this patient claims to occupy, if any.
    pub fn assigned_bed_id(&self) -> Option<&str> {
        self.bed_info.as_ref().map(|b| b.bed_id.as_str())
    }

    pub fn set_bed(&mut self, info: BedInfo) {
        self.is_in_bed = true;
        self.bed_info = Some(info);
    }

    pub fn clear_bed(&mut self) {
        self.is_in_bed = false;
        self.bed_info = None;
    }
}

impl Record for PatientRecord {
    fn key(&self) -> &str {
        &self.patient_id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self, now: OffsetDateTime) {
        self.version += 1;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now_utc;
    use serde_json::json;

    fn sample_new_patient() -> NewPatient {
        NewPatient {
            patient_id: "PT1".into(),
            name: "John Doe".into(),
            age: Some(45),
            gender: Some("male".into()),
            phone: None,
            status: PatientStatus::Admitted,
            current_hospital: Some("H1".into()),
            admission_reason: Some("chest pain".into()),
        }
    }

    #[test]
    fn test_patient_status_roundtrip() {
        for status in [
            PatientStatus::Admitted,
            PatientStatus::Discharged,
            PatientStatus::Transferred,
        ] {
            let parsed: PatientStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("lost".parse::<PatientStatus>().is_err());
    }

    #[test]
    fn test_from_new_opens_admission() {
        let patient = PatientRecord::from_new(sample_new_patient(), now_utc()).unwrap();

        assert_eq!(patient.status, PatientStatus::Admitted);
        assert_eq!(patient.current_hospital.as_deref(), Some("H1"));
        assert_eq!(patient.admission_history.len(), 1);

        let entry = patient.open_admission().unwrap();
        assert_eq!(entry.hospital_id, "H1");
        assert!(entry.is_open());
        assert_eq!(entry.status, PatientStatus::Admitted);
        assert_eq!(entry.reason.as_deref(), Some("chest pain"));
    }

    #[test]
    fn test_from_new_admitted_requires_hospital() {
        let mut new = sample_new_patient();
        new.current_hospital = None;
        let err = PatientRecord::from_new(new, now_utc()).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn test_from_new_discharged_has_no_history() {
        let mut new = sample_new_patient();
        new.status = PatientStatus::Discharged;
        new.current_hospital = None;
        let patient = PatientRecord::from_new(new, now_utc()).unwrap();

        assert!(patient.admission_history.is_empty());
        assert!(patient.open_admission().is_none());
        assert!(patient.current_hospital.is_none());
    }

    #[test]
    fn test_from_new_rejects_blank_identity() {
        let mut new = sample_new_patient();
        new.patient_id = "".into();
        assert!(PatientRecord::from_new(new, now_utc()).is_err());

        let mut new = sample_new_patient();
        new.name = " ".into();
        assert!(PatientRecord::from_new(new, now_utc()).is_err());
    }

    #[test]
    fn test_admission_entry_close() {
        let mut entry = AdmissionEntry::open("H1", None, now_utc());
        assert!(entry.is_open());

        entry.close(PatientStatus::Transferred, now_utc());
        assert!(!entry.is_open());
        assert_eq!(entry.status, PatientStatus::Transferred);
        assert!(entry.discharge_date.is_some());
    }

    #[test]
    fn test_set_and_clear_bed() {
        let mut patient = PatientRecord::from_new(sample_new_patient(), now_utc()).unwrap();
        assert!(patient.assigned_bed_id().is_none());

        patient.set_bed(BedInfo {
            bed_id: "bed-1".into(),
            bed_number: "B001".into(),
            room_number: "101".into(),
            department: "ICU".into(),
            hospital_id: "H1".into(),
        });
        assert!(patient.is_in_bed);
        assert_eq!(patient.assigned_bed_id(), Some("bed-1"));

        patient.clear_bed();
        assert!(!patient.is_in_bed);
        assert!(patient.bed_info.is_none());
    }

    #[test]
    fn test_open_admission_finds_latest() {
        let mut patient = PatientRecord::from_new(sample_new_patient(), now_utc()).unwrap();
        patient
            .open_admission_mut()
            .unwrap()
            .close(PatientStatus::Transferred, now_utc());
        patient
            .admission_history
            .push(AdmissionEntry::open("H2", None, now_utc()));

        let open = patient.open_admission().unwrap();
        assert_eq!(open.hospital_id, "H2");
    }

    #[test]
    fn test_new_patient_defaults() {
        let new: NewPatient = serde_json::from_value(json!({
            "patient_id": "PT9",
            "name": "Jane Smith",
            "current_hospital": "H1"
        }))
        .unwrap();

        assert_eq!(new.status, PatientStatus::Admitted);
        assert!(new.age.is_none());
    }

    #[test]
    fn test_patient_record_serialization() {
        let patient = PatientRecord::from_new(sample_new_patient(), now_utc()).unwrap();
        let json = serde_json::to_value(&patient).unwrap();

        assert_eq!(json["patient_id"], "PT1");
        assert_eq!(json["status"], "admitted");
        assert_eq!(json["is_in_bed"], false);
        assert_eq!(json["bed_info"], serde_json::Value::Null);
        assert_eq!(json["admission_history"][0]["hospital_id"], "H1");
        assert_eq!(
            json["admission_history"][0]["discharge_date"],
            serde_json::Value::Null
        );

        let back: PatientRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, patient);
    }
}
