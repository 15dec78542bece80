use thiserror::Error;
use wardflow_registry::RegistryError;

/// Errors surfaced by the assignment coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The patient holds no bed, so there is no bed-release to coordinate.
    #[error("Patient {patient_id} has no bed assigned")]
    NotAssigned { patient_id: String },

    /// A two-step operation completed its bed-side write but not the
    /// patient-side write. Surfaced distinctly so the reconciliation sweep
    /// can be run to repair the drift.
    #[error("Partial failure in {operation}: bed {bed_id} was updated but patient {patient_id} was not: {source}")]
    PartialFailure {
        operation: &'static str,
        bed_id: String,
        patient_id: String,
        #[source]
        source: Box<RegistryError>,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl CoordinatorError {
    pub fn not_assigned(patient_id: impl Into<String>) -> Self {
        Self::NotAssigned {
            patient_id: patient_id.into(),
        }
    }

    pub fn partial_failure(
        operation: &'static str,
        bed_id: impl Into<String>,
        patient_id: impl Into<String>,
        source: RegistryError,
    ) -> Self {
        Self::PartialFailure {
            operation,
            bed_id: bed_id.into(),
            patient_id: patient_id.into(),
            source: Box::new(source),
        }
    }

    pub fn is_not_assigned(&self) -> bool {
        matches!(self, Self::NotAssigned { .. })
    }

    pub fn is_partial_failure(&self) -> bool {
        matches!(self, Self::PartialFailure { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Registry(e) if e.is_not_found())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Registry(e) if e.is_conflict())
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::Registry(e) if e.is_invalid_transition())
    }
}
