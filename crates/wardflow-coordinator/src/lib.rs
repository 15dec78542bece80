//! Cross-registry coordination of bed assignments.
//!
//! A logical "assign patient to bed" spans two independently stored records
//! with no shared atomic commit. The coordinator keeps that honest with a
//! fixed step order (the bed is always written first, so it is the source of
//! truth after a crash), bounded retries on lost compare-and-set races, a
//! distinguishable partial-failure error when the second step cannot
//! complete, and an on-demand [reconciliation sweep](AssignmentCoordinator::reconcile)
//! that compares the cross-pointers and repairs drift.

pub mod coordinator;
pub mod error;
pub mod reconcile;

pub use coordinator::{Assignment, AssignmentCoordinator, ReleaseOutcome, MAX_CONFLICT_RETRIES};
pub use error::CoordinatorError;
pub use reconcile::{ReconciliationReport, RepairAction};
