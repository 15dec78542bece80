//! HTTP-level tests driving the router end to end.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use wardflow_server::{AppConfig, AppState, build_app};

fn app() -> Router {
    build_app(AppState::in_memory(), &AppConfig::default())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder.body(Body::from(v.to_string())).unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_bed(app: &Router, hospital: &str, number: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/hospitals/{hospital}/beds"),
        Some(json!({
            "bed_number": number,
            "room_number": "101",
            "department": "General",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["bed_id"].as_str().unwrap().to_string()
}

async fn create_patient(app: &Router, id: &str, hospital: &str) {
    let (status, body) = send(
        app,
        "POST",
        "/api/patients",
        Some(json!({
            "patient_id": id,
            "name": format!("Patient {id}"),
            "current_hospital": hospital,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["patient_id"], id);
}

#[tokio::test]
async fn health_endpoints() {
    let app = app();
    let (status, body) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "Wardflow Server");
}

#[tokio::test]
async fn bed_crud_over_http() {
    let app = app();
    let bed_id = create_bed(&app, "H1", "B001").await;

    let (status, body) = send(&app, "GET", &format!("/api/beds/{bed_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "available");
    assert_eq!(body["data"]["version"], 0);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/beds/{bed_id}"),
        Some(json!({ "room_number": "305" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["room_number"], "305");
    assert_eq!(body["data"]["version"], 1);

    let (status, _) = send(&app, "DELETE", &format!("/api/beds/{bed_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &format!("/api/beds/{bed_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "not_found");
}

#[tokio::test]
async fn direct_status_update_validates_patient() {
    let app = app();
    let bed_id = create_bed(&app, "H1", "B001").await;

    // Occupying for a patient that does not exist is refused.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/beds/{bed_id}/status"),
        Some(json!({ "status": "occupied", "patient_id": "ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "not_found");

    create_patient(&app, "PT1", "H1").await;
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/beds/{bed_id}/status"),
        Some(json!({ "status": "occupied", "patient_id": "PT1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["patient_id"], "PT1");

    // An occupied bed cannot be deleted.
    let (status, body) = send(&app, "DELETE", &format!("/api/beds/{bed_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "conflict");

    // And cannot be re-occupied.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/beds/{bed_id}/status"),
        Some(json!({ "status": "occupied", "patient_id": "PT1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "invalid_transition");
}

#[tokio::test]
async fn assignment_lifecycle_over_http() {
    let app = app();
    let bed_id = create_bed(&app, "H1", "B001").await;
    create_patient(&app, "PT1", "H1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/patients/PT1/assign-bed",
        Some(json!({ "bed_id": bed_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["bed"]["status"], "occupied");
    assert_eq!(body["data"]["patient"]["is_in_bed"], true);

    let (status, body) = send(&app, "POST", "/api/patients/PT1/discharge", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["patient"]["status"], "discharged");
    assert_eq!(body["data"]["released_bed"]["status"], "available");

    // Second discharge fails: not silently idempotent.
    let (status, body) = send(&app, "POST", "/api/patients/PT1/discharge", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "not_assigned");
}

#[tokio::test]
async fn transfer_over_http() {
    let app = app();
    let bed_id = create_bed(&app, "H1", "B001").await;
    create_patient(&app, "PT1", "H1").await;
    send(
        &app,
        "POST",
        "/api/patients/PT1/assign-bed",
        Some(json!({ "bed_id": bed_id })),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/patients/PT1/transfer",
        Some(json!({ "hospital_id": "H2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["patient"]["current_hospital"], "H2");
    assert_eq!(body["data"]["released_bed"]["status"], "available");

    let (_, body) = send(&app, "GET", "/api/patients/PT1", None).await;
    let history = body["data"]["admission_history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["status"], "transferred");
}

#[tokio::test]
async fn statistics_and_alerts_over_http() {
    let app = app();
    let mut bed_ids = Vec::new();
    for i in 0..10 {
        bed_ids.push(create_bed(&app, "H1", &format!("B{i:03}")).await);
    }
    for i in 0..9 {
        let pid = format!("PT{i}");
        create_patient(&app, &pid, "H1").await;
        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/patients/{pid}/assign-bed"),
            Some(json!({ "bed_id": bed_ids[i] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, "GET", "/api/hospitals/H1/beds/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["total_beds"], 10);
    assert_eq!(stats["occupied_beds"], 9);
    assert_eq!(stats["occupancy_rate"], 90.0);

    // Nine of ten beds occupied sits exactly on the critical boundary.
    let (status, body) = send(&app, "GET", "/api/hospitals/H1/alerts", None).await;
    assert_eq!(status, StatusCode::OK);
    let alerts = body["data"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["severity"], "critical");
    assert_eq!(alerts[0]["category"], "beds");

    // An understaffed department adds a warning.
    let (status, _) = send(
        &app,
        "PUT",
        "/api/hospitals/H1/staffing-snapshot",
        Some(json!({ "on_duty_by_department": { "General": 1 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/hospitals/H1/alerts", None).await;
    let alerts = body["data"].as_array().unwrap();
    assert_eq!(alerts.len(), 2);
    assert!(alerts.iter().any(|a| a["category"] == "staffing"));

    let (status, body) = send(&app, "GET", "/api/hospitals/H1/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["summary"]["occupied_beds"], 9);
    assert_eq!(body["data"]["summary"]["on_duty_staff"], 1);
}

#[tokio::test]
async fn reconcile_over_http() {
    let app = app();
    let bed_id = create_bed(&app, "H1", "B001").await;
    create_patient(&app, "PT1", "H1").await;

    // Manufacture drift: only the bed half of an assignment.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/beds/{bed_id}/status"),
        Some(json!({ "status": "occupied", "patient_id": "PT1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/api/hospitals/H1/reconcile", None).await;
    assert_eq!(status, StatusCode::OK);
    let repairs = body["data"]["repairs"].as_array().unwrap();
    assert_eq!(repairs.len(), 1);
    assert_eq!(repairs[0]["kind"], "completed_assignment");

    let (_, body) = send(&app, "GET", "/api/patients/PT1", None).await;
    assert_eq!(body["data"]["is_in_bed"], true);
    assert_eq!(body["data"]["bed_info"]["bed_id"], bed_id);
}

#[tokio::test]
async fn duplicate_patient_conflicts() {
    let app = app();
    create_patient(&app, "PT1", "H1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/patients",
        Some(json!({
            "patient_id": "PT1",
            "name": "Someone Else",
            "current_hospital": "H2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "already_exists");
}

#[tokio::test]
async fn validation_errors_are_bad_requests() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/hospitals/H1/beds",
        Some(json!({
            "bed_number": "",
            "room_number": "101",
            "department": "General",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation");

    // An admitted patient needs a hospital to open their admission entry.
    let (status, body) = send(
        &app,
        "POST",
        "/api/patients",
        Some(json!({ "patient_id": "PT1", "name": "John Doe" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation");
}
