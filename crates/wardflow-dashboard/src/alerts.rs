//! Threshold alerts evaluated at read time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use wardflow_registry::BedStatistics;

/// Occupancy ratio at or above which the capacity alert is critical.
pub const OCCUPANCY_CRITICAL: f64 = 0.90;
/// Occupancy ratio strictly above which the capacity alert is a warning.
pub const OCCUPANCY_WARNING: f64 = 0.80;
/// Minimum on-duty staff per department before a staffing warning fires.
pub const MIN_ON_DUTY_STAFF: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Beds,
    Staffing,
    Inventory,
}

/// One alert, recomputed per request and never stored.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub category: AlertCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// On-duty staff counts per department, supplied by the staffing
/// collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffingSnapshot {
    pub on_duty_by_department: BTreeMap<String, usize>,
}

impl StaffingSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_department(mut self, department: impl Into<String>, on_duty: usize) -> Self {
        self.on_duty_by_department
            .insert(department.into(), on_duty);
        self
    }

    pub fn total_on_duty(&self) -> usize {
        self.on_duty_by_department.values().sum()
    }
}

/// Stock alert counts, supplied by the inventory collaborator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub low_stock_items: usize,
    pub expiring_items: usize,
}

/// Capacity alert from current bed statistics.
///
/// The 90% boundary is inclusive: a ward at exactly nine of ten beds is
/// already critical.
pub fn occupancy_alert(stats: &BedStatistics, now: OffsetDateTime) -> Option<Alert> {
    let ratio = stats.occupancy_ratio();
    let pct = ratio * 100.0;

    let (severity, message) = if ratio >= OCCUPANCY_CRITICAL {
        (
            AlertSeverity::Critical,
            format!("Hospital is at {pct:.1}% capacity"),
        )
    } else if ratio > OCCUPANCY_WARNING {
        (
            AlertSeverity::Warning,
            format!("Hospital capacity is at {pct:.1}%"),
        )
    } else {
        return None;
    };

    Some(Alert {
        severity,
        category: AlertCategory::Beds,
        message,
        department: None,
        occupancy_rate: Some(pct),
        count: None,
        timestamp: now,
    })
}

/// One warning per department with fewer than [`MIN_ON_DUTY_STAFF`] staff on
/// duty.
pub fn staffing_alerts(staffing: &StaffingSnapshot, now: OffsetDateTime) -> Vec<Alert> {
    staffing
        .on_duty_by_department
        .iter()
        .filter(|&(_, &on_duty)| on_duty < MIN_ON_DUTY_STAFF)
        .map(|(department, &on_duty)| Alert {
            severity: AlertSeverity::Warning,
            category: AlertCategory::Staffing,
            message: format!("{department} department has only {on_duty} staff on duty"),
            department: Some(department.clone()),
            occupancy_rate: None,
            count: Some(on_duty),
            timestamp: now,
        })
        .collect()
}

/// Low-stock and expiry warnings from the inventory snapshot.
pub fn inventory_alerts(inventory: &InventorySnapshot, now: OffsetDateTime) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if inventory.low_stock_items > 0 {
        alerts.push(Alert {
            severity: AlertSeverity::Warning,
            category: AlertCategory::Inventory,
            message: format!(
                "{} items are running low on stock",
                inventory.low_stock_items
            ),
            department: None,
            occupancy_rate: None,
            count: Some(inventory.low_stock_items),
            timestamp: now,
        });
    }
    if inventory.expiring_items > 0 {
        alerts.push(Alert {
            severity: AlertSeverity::Warning,
            category: AlertCategory::Inventory,
            message: format!("{} items are expiring soon", inventory.expiring_items),
            department: None,
            occupancy_rate: None,
            count: Some(inventory.expiring_items),
            timestamp: now,
        });
    }
    alerts
}
