use crate::Record;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Occupancy state of a bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BedStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
}

impl BedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for BedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BedStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(CoreError::invalid_status(other)),
        }
    }
}

/// Kind of care slot a bed provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BedType {
    #[default]
    Standard,
    #[serde(alias = "ICU")]
    Icu,
    Emergency,
}

impl fmt::Display for BedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Icu => write!(f, "icu"),
            Self::Emergency => write!(f, "emergency"),
        }
    }
}

/// Input payload for creating a bed.
///
/// `bed_number`, `room_number` and `department` are required; the rest fall
/// back to the same defaults the admission desk expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBed {
    #[serde(default = "default_hospital")]
    pub hospital_id: String,
    pub bed_number: String,
    pub room_number: String,
    pub department: String,
    #[serde(default)]
    pub bed_type: BedType,
    #[serde(default = "default_floor")]
    pub floor: i32,
    #[serde(default = "default_wing")]
    pub wing: String,
}

fn default_hospital() -> String {
    "DEFAULT".to_string()
}

fn default_floor() -> i32 {
    1
}

fn default_wing() -> String {
    "Main".to_string()
}

impl NewBed {
    /// Rejects payloads missing the required identifying fields.
    pub fn validate(&self) -> Result<()> {
        if self.bed_number.trim().is_empty() {
            return Err(CoreError::validation("bed_number is required"));
        }
        if self.room_number.trim().is_empty() {
            return Err(CoreError::validation("room_number is required"));
        }
        if self.department.trim().is_empty() {
            return Err(CoreError::validation("department is required"));
        }
        Ok(())
    }
}

/// Partial update of the non-status, non-patient bed fields.
///
/// Status and patient pointer changes go through the status-transition
/// operation; they are deliberately not representable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BedDetailsUpdate {
    pub bed_number: Option<String>,
    pub room_number: Option<String>,
    pub department: Option<String>,
    pub bed_type: Option<BedType>,
    pub floor: Option<i32>,
    pub wing: Option<String>,
}

impl BedDetailsUpdate {
    pub fn is_empty(&self) -> bool {
        self.bed_number.is_none()
            && self.room_number.is_none()
            && self.department.is_none()
            && self.bed_type.is_none()
            && self.floor.is_none()
            && self.wing.is_none()
    }
}

/// A physical care slot with its occupancy state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedRecord {
    pub id: String,
    pub hospital_id: String,
    pub bed_number: String,
    pub room_number: String,
    pub department: String,
    pub bed_type: BedType,
    pub status: BedStatus,
    pub patient_id: Option<String>,
    pub floor: i32,
    pub wing: String,
    pub version: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl BedRecord {
    /// Builds a fresh record from a validated creation payload.
    pub fn from_new(id: String, new: NewBed, now: OffsetDateTime) -> Self {
        Self {
            id,
            hospital_id: new.hospital_id,
            bed_number: new.bed_number,
            room_number: new.room_number,
            department: new.department,
            bed_type: new.bed_type,
            status: BedStatus::Available,
            patient_id: None,
            floor: new.floor,
            wing: new.wing,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.status == BedStatus::Occupied
    }

    /// Applies a details update in place. Returns whether anything changed.
    pub fn apply_details(&mut self, update: &BedDetailsUpdate) -> bool {
        let mut changed = false;
        if let Some(ref v) = update.bed_number {
            self.bed_number = v.clone();
            changed = true;
        }
        if let Some(ref v) = update.room_number {
            self.room_number = v.clone();
            changed = true;
        }
        if let Some(ref v) = update.department {
            self.department = v.clone();
            changed = true;
        }
        if let Some(v) = update.bed_type {
            self.bed_type = v;
            changed = true;
        }
        if let Some(v) = update.floor {
            self.floor = v;
            changed = true;
        }
        if let Some(ref v) = update.wing {
            self.wing = v.clone();
            changed = true;
        }
        changed
    }
}

impl Record for BedRecord {
    fn key(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self, now: OffsetDateTime) {
        self.version += 1;
        self.updated_at = now;
    }
}
