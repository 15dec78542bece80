use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppConfig, handlers, state::AppState};

pub struct WardflowServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Beds
        .route(
            "/api/hospitals/{hospital_id}/beds",
            get(handlers::list_hospital_beds).post(handlers::create_bed),
        )
        .route(
            "/api/hospitals/{hospital_id}/beds/stats",
            get(handlers::bed_statistics),
        )
        .route(
            "/api/hospitals/{hospital_id}/departments",
            get(handlers::hospital_departments),
        )
        .route(
            "/api/beds/{bed_id}",
            get(handlers::get_bed)
                .put(handlers::update_bed_details)
                .delete(handlers::delete_bed),
        )
        .route("/api/beds/{bed_id}/status", put(handlers::update_bed_status))
        // Patients
        .route("/api/patients", post(handlers::create_patient))
        .route("/api/patients/search", get(handlers::search_patients))
        .route("/api/patients/{patient_id}", get(handlers::get_patient))
        .route(
            "/api/patients/{patient_id}/assign-bed",
            post(handlers::assign_bed),
        )
        .route(
            "/api/patients/{patient_id}/discharge",
            post(handlers::discharge_patient),
        )
        .route(
            "/api/patients/{patient_id}/transfer",
            post(handlers::transfer_patient),
        )
        .route(
            "/api/hospitals/{hospital_id}/patients",
            get(handlers::list_hospital_patients),
        )
        .route(
            "/api/hospitals/{hospital_id}/patients/stats",
            get(handlers::patient_statistics),
        )
        // Dashboard, alerts and reconciliation
        .route(
            "/api/hospitals/{hospital_id}/alerts",
            get(handlers::hospital_alerts),
        )
        .route(
            "/api/hospitals/{hospital_id}/dashboard",
            get(handlers::hospital_dashboard),
        )
        .route(
            "/api/hospitals/{hospital_id}/reconcile",
            post(handlers::reconcile),
        )
        .route(
            "/api/hospitals/{hospital_id}/staffing-snapshot",
            put(handlers::put_staffing_snapshot),
        )
        .route(
            "/api/hospitals/{hospital_id}/inventory-snapshot",
            put(handlers::put_inventory_snapshot),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    state: Option<AppState>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            state: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn build(self) -> WardflowServer {
        let state = self.state.unwrap_or_else(AppState::in_memory);
        let app = build_app(state, &self.config);

        WardflowServer {
            addr: self.addr,
            app,
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WardflowServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
