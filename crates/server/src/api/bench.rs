//! Benchmark job endpoints: creation, polling, summary, CSV export.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use qapbench_core::{BenchJob, BenchRequest, InstanceResult};

use super::{error_response, not_found};
use crate::bench::scheduler;
use crate::state::AppState;

// ── Creation ────────────────────────────────────────────────────────

/// POST /bench — accept a benchmark job; 202 with the job id, 400 when the
/// scheduler rejects the request.
pub async fn bench_create(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let payload: BenchRequest = serde_json::from_slice(&body)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", e)))?;

    match scheduler::start_benchmark_job(&state, payload) {
        Some(job_id) => Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "job_id": job_id, "status": "running" })),
        )),
        None => Err(error_response(
            StatusCode::BAD_REQUEST,
            "unsupported benchmark type or no resolvable instance directory",
        )),
    }
}

// ── Read projections ────────────────────────────────────────────────

/// GET /bench/summary — `{jobs: {id: {status, created}}}`.
pub async fn bench_summary(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut jobs = serde_json::Map::new();
    for overview in state.jobs.list() {
        jobs.insert(
            overview.id,
            json!({ "status": overview.status, "created": overview.created_at }),
        );
    }
    Json(json!({ "jobs": jobs }))
}

/// GET /bench/{job_id} — full job JSON, or 404.
pub async fn bench_get(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<BenchJob>, (StatusCode, Json<Value>)> {
    state
        .jobs
        .get(&job_id)
        .map(Json)
        .ok_or_else(|| not_found(format!("job not found: {}", job_id)))
}

/// GET /bench/{job_id}/csv — results as a CSV attachment, or 404.
pub async fn bench_csv(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    let job = state
        .jobs
        .get(&job_id)
        .ok_or_else(|| not_found(format!("job not found: {}", job_id)))?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.csv\"", job_id),
        ),
    ];
    Ok((headers, results_csv(&job.results)))
}

// ── CSV rendering ───────────────────────────────────────────────────

pub(crate) const CSV_HEADER: &str =
    "instance,n,mode,objective,solve_time,bound,bound_gap,bound_gap_pct,error";

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub(crate) fn results_csv(results: &[InstanceResult]) -> String {
    let mut out = String::with_capacity(64 * (results.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in results {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            csv_field(&r.instance),
            r.n,
            csv_field(&r.mode),
            csv_opt(r.objective),
            r.solve_time,
            csv_opt(r.bound),
            csv_opt(r.bound_gap),
            csv_opt(r.bound_gap_pct),
            csv_field(r.error.as_deref().unwrap_or("")),
        ));
    }
    out
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(instance: &str, objective: Option<f64>, error: Option<&str>) -> InstanceResult {
        InstanceResult {
            instance: instance.to_string(),
            n: 12,
            mode: "hybrid".to_string(),
            objective,
            solve_time: 0.25,
            bound: objective.map(|o| o - 10.0),
            bound_gap: objective.map(|_| 10.0),
            bound_gap_pct: objective.map(|o| 10.0 / o.abs().max(1.0)),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_csv_two_records_three_lines() {
        let csv = results_csv(&[
            record("chr12a", Some(100.0), None),
            record("nug12", Some(200.0), None),
        ]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "chr12a,12,hybrid,100,0.25,90,10,0.1,");
    }

    #[test]
    fn test_csv_error_record_has_empty_numeric_fields() {
        let csv = results_csv(&[record("tai20a", None, Some("backend exploded"))]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "tai20a,12,hybrid,,0.25,,,,backend exploded");
    }

    #[test]
    fn test_csv_quotes_embedded_commas() {
        let csv = results_csv(&[record("x", None, Some("bad, very bad"))]);
        assert!(csv.lines().nth(1).unwrap().ends_with("\"bad, very bad\""));
    }

    #[test]
    fn test_csv_empty_results_is_header_only() {
        let csv = results_csv(&[]);
        assert_eq!(csv, format!("{}\n", CSV_HEADER));
    }
}
