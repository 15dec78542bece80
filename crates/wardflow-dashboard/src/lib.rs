//! Read-only statistics and alert views over the registries.
//!
//! Nothing here is persisted: every dashboard request recomputes its alerts
//! from current registry state, so the view is always consistent with the
//! data at the cost of a scan per request.

pub mod alerts;
pub mod service;

pub use alerts::{
    Alert, AlertCategory, AlertSeverity, InventorySnapshot, StaffingSnapshot, MIN_ON_DUTY_STAFF,
    OCCUPANCY_CRITICAL, OCCUPANCY_WARNING,
};
pub use service::{DashboardService, DashboardSummary, HospitalDashboard};
