//! HTML surfaces: dashboard, job detail, form-driven job creation, and
//! persisted static reports.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use axum::{Form, Json};
use minijinja::context;
use serde::Deserialize;
use serde_json::Value;

use qapbench_core::BenchRequest;

use super::{error_response, not_found};
use crate::bench::{report, scheduler, templates};
use crate::state::AppState;

// ── Dashboard & detail ──────────────────────────────────────────────

/// GET /bench/ui — job listing with a new-benchmark form.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, Json<Value>)> {
    let jobs = state.jobs.list();
    templates::env()
        .get_template("dashboard")
        .and_then(|t| t.render(context! { jobs => jobs }))
        .map(Html)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// GET /bench/ui/{job_id} — rendered job detail, or 404.
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Html<String>, (StatusCode, Json<Value>)> {
    let job = state
        .jobs
        .get(&job_id)
        .ok_or_else(|| not_found(format!("job not found: {}", job_id)))?;
    report::render_job_page(&job, false)
        .map(Html)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

// ── Form-driven creation ────────────────────────────────────────────

/// Browser form fields; everything arrives as strings.
#[derive(Debug, Deserialize)]
pub struct BenchForm {
    #[serde(default)]
    pub modes: Option<String>,
    #[serde(default)]
    pub instances: Option<String>,
    #[serde(default)]
    pub time_limit: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub robust_eps: Option<String>,
    #[serde(default)]
    pub data_dir: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl BenchForm {
    fn into_request(self) -> BenchRequest {
        let modes = non_empty(self.modes)
            .map(|s| {
                s.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        BenchRequest {
            bench_type: "qaplib".to_string(),
            modes,
            instances: non_empty(self.instances),
            time_limit: non_empty(self.time_limit).and_then(|s| s.parse().ok()),
            backend: non_empty(self.backend),
            robust_eps: non_empty(self.robust_eps).and_then(|s| s.parse().ok()),
            data_dir: non_empty(self.data_dir),
        }
    }
}

/// POST /bench/ui/new — start a job from the dashboard form and redirect
/// (303) to its detail page.
pub async fn bench_create_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<BenchForm>,
) -> Result<Redirect, (StatusCode, Json<Value>)> {
    let payload = form.into_request();
    match scheduler::start_benchmark_job(&state, payload) {
        Some(job_id) => Ok(Redirect::to(&format!("/bench/ui/{}", job_id))),
        None => Err(error_response(
            StatusCode::BAD_REQUEST,
            "unsupported benchmark type or no resolvable instance directory",
        )),
    }
}

// ── Static reports ──────────────────────────────────────────────────

fn safe_report_stem(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// GET /bench/reports — the regenerated report index.
pub async fn report_index(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, Json<Value>)> {
    serve_report_file(&state, "index")
}

/// GET /bench/reports/{job_id} — a persisted per-job report.
pub async fn report(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Html<String>, (StatusCode, Json<Value>)> {
    serve_report_file(&state, &job_id)
}

fn serve_report_file(
    state: &AppState,
    stem: &str,
) -> Result<Html<String>, (StatusCode, Json<Value>)> {
    if !state.config.bench.reports || !safe_report_stem(stem) {
        return Err(not_found(format!("report not found: {}", stem)));
    }
    let path = state.config.bench.report_dir.join(format!("{}.html", stem));
    std::fs::read_to_string(&path)
        .map(Html)
        .map_err(|_| not_found(format!("report not found: {}", stem)))
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_comma_modes_normalized() {
        let form = BenchForm {
            modes: Some("hybrid, nesterov ,".to_string()),
            instances: Some("".to_string()),
            time_limit: Some("15".to_string()),
            backend: None,
            robust_eps: None,
            data_dir: None,
        };
        let req = form.into_request();
        assert_eq!(req.bench_type, "qaplib");
        assert_eq!(req.modes, vec!["hybrid", "nesterov"]);
        assert!(req.instances.is_none());
        assert_eq!(req.time_limit, Some(15.0));
    }

    #[test]
    fn test_safe_report_stem_rejects_traversal() {
        assert!(safe_report_stem("b-12"));
        assert!(!safe_report_stem("../etc/passwd"));
        assert!(!safe_report_stem(""));
        assert!(!safe_report_stem("b/1"));
    }
}
