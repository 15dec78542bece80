use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wardflow_api::{ApiError, created, ok};
use wardflow_core::{BedDetailsUpdate, BedStatus, NewBed, NewPatient, PatientStatus};
use wardflow_coordinator::CoordinatorError;
use wardflow_dashboard::{InventorySnapshot, StaffingSnapshot};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Wardflow Server",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

// ---- Beds ----

#[derive(Debug, Deserialize)]
pub struct BedListQuery {
    pub status: Option<BedStatus>,
    pub department: Option<String>,
}

pub async fn create_bed(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
    Json(mut payload): Json<NewBed>,
) -> Result<impl IntoResponse, ApiError> {
    // The path names the hospital; the payload must not disagree.
    payload.hospital_id = hospital_id;
    let bed = state.beds.create_bed(payload).await?;
    Ok(created(json!({ "bed_id": bed.id })))
}

pub async fn list_hospital_beds(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
    Query(query): Query<BedListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut beds = match query.status {
        Some(status) => state.beds.beds_by_status(status, Some(&hospital_id)).await?,
        None => state.beds.list_beds(Some(&hospital_id)).await?,
    };
    if let Some(department) = query.department {
        beds.retain(|b| b.department == department);
    }
    Ok(ok(beds))
}

pub async fn get_bed(
    State(state): State<AppState>,
    Path(bed_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bed = state.beds.get_bed(&bed_id).await?;
    Ok(ok(bed))
}

pub async fn update_bed_details(
    State(state): State<AppState>,
    Path(bed_id): Path<String>,
    Json(update): Json<BedDetailsUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let bed = state.beds.update_details(&bed_id, &update).await?;
    Ok(ok(bed))
}

pub async fn delete_bed(
    State(state): State<AppState>,
    Path(bed_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state.beds.delete_bed(&bed_id).await?;
    Ok(ok(json!({ "bed_id": removed.id })))
}

#[derive(Debug, Deserialize)]
pub struct BedStatusBody {
    pub status: BedStatus,
    pub patient_id: Option<String>,
}

pub async fn update_bed_status(
    State(state): State<AppState>,
    Path(bed_id): Path<String>,
    Json(body): Json<BedStatusBody>,
) -> Result<impl IntoResponse, ApiError> {
    // A bed may only be marked occupied for a patient that exists.
    if body.status == BedStatus::Occupied
        && let Some(ref patient_id) = body.patient_id
    {
        state.patients.get_patient(patient_id).await?;
    }
    let bed = state
        .beds
        .update_status(&bed_id, body.status, body.patient_id.as_deref())
        .await?;
    Ok(ok(bed))
}

pub async fn bed_statistics(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.beds.statistics(Some(&hospital_id)).await?;
    Ok(ok(stats))
}

pub async fn hospital_departments(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let departments = state.beds.departments(&hospital_id).await?;
    Ok(ok(departments))
}

// ---- Patients ----

pub async fn create_patient(
    State(state): State<AppState>,
    Json(payload): Json<NewPatient>,
) -> Result<impl IntoResponse, ApiError> {
    let patient = state.patients.create_patient(payload).await?;
    Ok(created(json!({ "patient_id": patient.patient_id })))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let patient = state.patients.get_patient(&patient_id).await?;
    Ok(ok(patient))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

pub async fn search_patients(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let patients = state.patients.search(&query.q).await?;
    Ok(ok(patients))
}

pub async fn list_hospital_patients(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let patients = state.patients.patients_by_hospital(&hospital_id).await?;
    Ok(ok(patients))
}

pub async fn patient_statistics(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.patients.statistics(Some(&hospital_id)).await?;
    Ok(ok(stats))
}

// ---- Assignment coordination ----

#[derive(Debug, Deserialize)]
pub struct AssignBody {
    pub bed_id: String,
}

pub async fn assign_bed(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    Json(body): Json<AssignBody>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.coordinator.assign(&patient_id, &body.bed_id).await?;
    Ok(ok(json!({
        "bed": outcome.bed,
        "patient": outcome.patient,
    })))
}

pub async fn discharge_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let patient = state.patients.get_patient(&patient_id).await?;

    if patient.assigned_bed_id().is_some() {
        let outcome = state.coordinator.discharge(&patient_id).await?;
        return Ok(ok(json!({
            "patient": outcome.patient,
            "released_bed": outcome.released_bed,
        })));
    }

    // No bed held: a plain status discharge, unless there is nothing left
    // to discharge.
    if patient.status == PatientStatus::Admitted {
        let patient = state.patients.discharge(&patient_id).await?;
        return Ok(ok(json!({ "patient": patient })));
    }

    Err(CoordinatorError::not_assigned(&patient_id).into())
}

#[derive(Debug, Deserialize)]
pub struct TransferBody {
    pub hospital_id: String,
}

pub async fn transfer_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    Json(body): Json<TransferBody>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .coordinator
        .transfer(&patient_id, &body.hospital_id)
        .await?;
    Ok(ok(json!({
        "patient": outcome.patient,
        "released_bed": outcome.released_bed,
    })))
}

pub async fn reconcile(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.coordinator.reconcile(Some(&hospital_id)).await?;
    Ok(ok(report))
}

// ---- Dashboard & alerts ----

pub async fn hospital_alerts(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (staffing, inventory) = snapshots_for(&state, &hospital_id).await;
    let alerts = state
        .dashboard
        .hospital_alerts(&hospital_id, &staffing, inventory.as_ref())
        .await?;
    Ok(ok(alerts))
}

pub async fn hospital_dashboard(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (staffing, inventory) = snapshots_for(&state, &hospital_id).await;
    let dashboard = state
        .dashboard
        .hospital_dashboard(&hospital_id, &staffing, inventory.as_ref())
        .await?;
    Ok(ok(dashboard))
}

async fn snapshots_for(
    state: &AppState,
    hospital_id: &str,
) -> (StaffingSnapshot, Option<InventorySnapshot>) {
    let snapshots = state.snapshots.read().await;
    (
        snapshots
            .staffing
            .get(hospital_id)
            .cloned()
            .unwrap_or_default(),
        snapshots.inventory.get(hospital_id).copied(),
    )
}

pub async fn put_staffing_snapshot(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
    Json(snapshot): Json<StaffingSnapshot>,
) -> Result<impl IntoResponse, ApiError> {
    let mut snapshots = state.snapshots.write().await;
    snapshots.staffing.insert(hospital_id.clone(), snapshot);
    Ok(ok(json!({ "hospital_id": hospital_id })))
}

pub async fn put_inventory_snapshot(
    State(state): State<AppState>,
    Path(hospital_id): Path<String>,
    Json(snapshot): Json<InventorySnapshot>,
) -> Result<impl IntoResponse, ApiError> {
    let mut snapshots = state.snapshots.write().await;
    snapshots.inventory.insert(hospital_id.clone(), snapshot);
    Ok(ok(json!({ "hospital_id": hospital_id })))
}
