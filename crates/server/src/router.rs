//! HTTP router construction.
//!
//! Assembles all Axum routes and middleware into a single `Router`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let max_body = state.config.solve.max_body_bytes;

    Router::new()
        .route("/health", get(api::health))
        .route("/solve", post(api::solve))
        .route("/bench", post(api::bench_create))
        // Static segments (summary, ui, reports) outrank the {job_id} captures.
        .route("/bench/summary", get(api::bench_summary))
        .route("/bench/ui", get(api::ui::dashboard))
        .route("/bench/ui/new", post(api::ui::bench_create_form))
        .route("/bench/ui/{job_id}", get(api::ui::detail))
        .route("/bench/reports", get(api::ui::report_index))
        .route("/bench/reports/{job_id}", get(api::ui::report))
        .route("/bench/{job_id}", get(api::bench_get))
        .route("/bench/{job_id}/csv", get(api::bench_csv))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
