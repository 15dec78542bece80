use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use wardflow_coordinator::AssignmentCoordinator;
use wardflow_dashboard::{DashboardService, InventorySnapshot, StaffingSnapshot};
use wardflow_registry::{BedRegistry, PatientRegistry};

/// Externally supplied snapshots, keyed by hospital. The staffing and
/// inventory collaborators push these; the dashboard only reads them.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    pub staffing: HashMap<String, StaffingSnapshot>,
    pub inventory: HashMap<String, InventorySnapshot>,
}

/// Shared handles injected into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub beds: BedRegistry,
    pub patients: PatientRegistry,
    pub coordinator: AssignmentCoordinator,
    pub dashboard: DashboardService,
    pub snapshots: Arc<RwLock<SnapshotStore>>,
}

impl AppState {
    /// Wires every component against fresh in-memory collections.
    pub fn in_memory() -> Self {
        let beds = BedRegistry::in_memory();
        let patients = PatientRegistry::in_memory();
        Self {
            coordinator: AssignmentCoordinator::new(beds.clone(), patients.clone()),
            dashboard: DashboardService::new(beds.clone(), patients.clone()),
            beds,
            patients,
            snapshots: Arc::new(RwLock::new(SnapshotStore::default())),
        }
    }
}
