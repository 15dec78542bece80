pub mod bed;
pub mod error;
pub mod id;
pub mod patient;
pub mod time;

pub use bed::{BedDetailsUpdate, BedRecord, BedStatus, BedType, NewBed};
pub use error::{CoreError, ErrorCategory, Result};
pub use id::generate_id;
pub use patient::{AdmissionEntry, BedInfo, NewPatient, PatientRecord, PatientStatus};
pub use time::now_utc;

/// Contract every stored record fulfils: a stable key plus an optimistic
/// concurrency version that is bumped on every mutating write.
pub trait Record {
    /// Storage key of this record.
    fn key(&self) -> &str;

    /// Current version, compared at write time.
    fn version(&self) -> u64;

    /// Increments the version and refreshes the update timestamp.
    fn bump_version(&mut self, now: ::time::OffsetDateTime);
}
