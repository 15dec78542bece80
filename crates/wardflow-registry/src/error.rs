use thiserror::Error;
use wardflow_core::{BedStatus, CoreError};
use wardflow_storage::StorageError;

/// Operation errors surfaced by the bed and patient registries.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("Invalid bed status transition: {from} -> {to}")]
    InvalidTransition { from: BedStatus, to: BedStatus },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Storage-level failure that has no registry-level meaning
    /// (version conflicts, availability problems).
    #[error(transparent)]
    Store(#[from] StorageError),
}

impl RegistryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn already_exists(kind: &'static str, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    pub fn invalid_transition(from: BedStatus, to: BedStatus) -> Self {
        Self::InvalidTransition { from, to }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Translates a storage error for the given record into the registry
    /// taxonomy. Version conflicts and availability problems pass through
    /// untranslated.
    pub fn from_store(kind: &'static str, id: &str, err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => Self::not_found(kind, id),
            StorageError::AlreadyExists { .. } => Self::already_exists(kind, id),
            other => Self::Store(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }

    /// True when another writer won a compare-and-set race; the operation
    /// may be retried from a fresh read.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_version_conflict())
    }

    /// True for any conflict: a state that forbids the action or a lost
    /// compare-and-set race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. }) || self.is_version_conflict()
    }
}

impl From<CoreError> for RegistryError {
    fn from(err: CoreError) -> Self {
        Self::Validation {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = RegistryError::not_found("bed", "bed-1");
        assert_eq!(err.to_string(), "bed not found: bed-1");

        let err = RegistryError::invalid_transition(BedStatus::Maintenance, BedStatus::Occupied);
        assert_eq!(
            err.to_string(),
            "Invalid bed status transition: maintenance -> occupied"
        );
    }

    #[test]
    fn test_from_store_translation() {
        let err = RegistryError::from_store("bed", "bed-1", StorageError::not_found("beds", "bed-1"));
        assert!(err.is_not_found());

        let err = RegistryError::from_store(
            "patient",
            "PT1",
            StorageError::already_exists("patients", "PT1"),
        );
        assert!(err.is_already_exists());

        let err = RegistryError::from_store("bed", "bed-1", StorageError::version_conflict(1, 2));
        assert!(err.is_version_conflict());
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_core_error_maps_to_validation() {
        let err: RegistryError = CoreError::validation("bed_number is required").into();
        assert!(err.is_validation());
    }

    #[test]
    fn test_conflict_predicates() {
        let err = RegistryError::conflict("bed bed-1 is occupied");
        assert!(err.is_conflict());
        assert!(!err.is_version_conflict());
    }
}
