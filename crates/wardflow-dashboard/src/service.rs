//! Dashboard aggregation over both registries.

use serde::Serialize;
use time::OffsetDateTime;
use wardflow_core::now_utc;
use wardflow_registry::{
    BedRegistry, BedStatistics, PatientRegistry, PatientStatistics, RegistryError,
};

use crate::alerts::{
    Alert, InventorySnapshot, StaffingSnapshot, inventory_alerts, occupancy_alert, staffing_alerts,
};

type Result<T> = std::result::Result<T, RegistryError>;

/// Headline numbers for a hospital.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_beds: usize,
    pub available_beds: usize,
    pub occupied_beds: usize,
    pub occupancy_rate: f64,
    pub total_patients: usize,
    pub admitted_patients: usize,
    pub on_duty_staff: usize,
}

/// Everything a dashboard request returns, assembled from current state.
#[derive(Debug, Clone, Serialize)]
pub struct HospitalDashboard {
    pub hospital_id: String,
    pub summary: DashboardSummary,
    pub bed_statistics: BedStatistics,
    pub patient_statistics: PatientStatistics,
    pub alerts: Vec<Alert>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

/// Read-only view over the registries. Queries both independently and never
/// mutates either.
#[derive(Clone)]
pub struct DashboardService {
    beds: BedRegistry,
    patients: PatientRegistry,
}

impl DashboardService {
    pub fn new(beds: BedRegistry, patients: PatientRegistry) -> Self {
        Self { beds, patients }
    }

    /// Current alerts for a hospital, recomputed from live statistics plus
    /// the externally supplied snapshots.
    pub async fn hospital_alerts(
        &self,
        hospital_id: &str,
        staffing: &StaffingSnapshot,
        inventory: Option<&InventorySnapshot>,
    ) -> Result<Vec<Alert>> {
        let now = now_utc();
        let bed_stats = self.beds.statistics(Some(hospital_id)).await?;

        let mut alerts = Vec::new();
        if let Some(inv) = inventory {
            alerts.extend(inventory_alerts(inv, now));
        }
        alerts.extend(occupancy_alert(&bed_stats, now));
        alerts.extend(staffing_alerts(staffing, now));
        Ok(alerts)
    }

    /// Full dashboard for a hospital.
    pub async fn hospital_dashboard(
        &self,
        hospital_id: &str,
        staffing: &StaffingSnapshot,
        inventory: Option<&InventorySnapshot>,
    ) -> Result<HospitalDashboard> {
        let bed_statistics = self.beds.statistics(Some(hospital_id)).await?;
        let patient_statistics = self.patients.statistics(Some(hospital_id)).await?;
        let alerts = self
            .hospital_alerts(hospital_id, staffing, inventory)
            .await?;

        let summary = DashboardSummary {
            total_beds: bed_statistics.total_beds,
            available_beds: bed_statistics.available_beds,
            occupied_beds: bed_statistics.occupied_beds,
            occupancy_rate: bed_statistics.occupancy_rate,
            total_patients: patient_statistics.total_patients,
            admitted_patients: patient_statistics.admitted_patients,
            on_duty_staff: staffing.total_on_duty(),
        };

        Ok(HospitalDashboard {
            hospital_id: hospital_id.to_string(),
            summary,
            bed_statistics,
            patient_statistics,
            alerts,
            last_updated: now_utc(),
        })
    }
}
