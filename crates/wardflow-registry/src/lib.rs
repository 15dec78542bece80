//! Bed and patient registries.
//!
//! Each registry owns one record collection behind an injected
//! [`wardflow_storage::RecordStore`] handle and exposes the validated
//! operations of that collection: status transitions and occupancy pointers
//! for beds, admission lifecycle and bed-assignment pointers for patients.
//! Cross-collection coordination lives one layer up, in the coordinator.

pub mod beds;
pub mod error;
pub mod patients;

pub use beds::{BedRegistry, BedStatistics, DepartmentBedStats};
pub use error::RegistryError;
pub use patients::{PatientRegistry, PatientStatistics};
