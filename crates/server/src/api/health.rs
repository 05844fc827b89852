//! Liveness and capability probe.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub solver: String,
    pub data_dir_ok: bool,
    pub history: bool,
    pub reports: bool,
    pub jobs: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        solver: state.solver.name().to_string(),
        data_dir_ok: state.config.bench.qaplib_dir().is_dir(),
        history: state.config.bench.history,
        reports: state.config.bench.reports,
        jobs: state.jobs.len(),
    })
}
