//! Benchmark job scheduler.
//!
//! [`start_benchmark_job`] is the entry point: it validates the request,
//! registers a `Running` job, and spawns the runner as a fire-and-forget
//! tokio task. The spawned task's only write to shared state is the single
//! terminal [`JobUpdate`]; the history append and report render that follow
//! are best-effort and never touch the job's recorded status.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use qapbench_core::{BenchRequest, BenchSummary};

use crate::bench::store::JobUpdate;
use crate::bench::{report, runner};
use crate::state::AppState;

// ── Public API ──────────────────────────────────────────────────────

/// Validate and launch a benchmark job. Returns the job id, or `None` when
/// the request is rejected (unsupported type, unresolvable data directory)
/// — the caller answers 400.
pub fn start_benchmark_job(state: &Arc<AppState>, payload: BenchRequest) -> Option<String> {
    if payload.bench_type != "qaplib" {
        warn!(bench_type = %payload.bench_type, "rejecting unsupported benchmark type");
        return None;
    }

    let data_dir = resolve_data_dir(state, &payload)?;

    let job_id = state.jobs.create(payload.clone());
    info!(
        job_id = %job_id,
        data_dir = %data_dir.display(),
        modes = ?payload.effective_modes(),
        "benchmark job accepted"
    );

    let state = state.clone();
    let id = job_id.clone();
    tokio::spawn(async move {
        run_job(state, id, payload, data_dir).await;
    });

    Some(job_id)
}

/// Data directory: request override first, configured QAPLIB default
/// otherwise. Either way it must exist as a directory; an unresolvable
/// location rejects the request before a job is created.
fn resolve_data_dir(state: &AppState, payload: &BenchRequest) -> Option<PathBuf> {
    let candidate = match &payload.data_dir {
        Some(dir) => PathBuf::from(dir),
        None => state.config.bench.qaplib_dir(),
    };
    if candidate.is_dir() {
        Some(candidate)
    } else {
        warn!(data_dir = %candidate.display(), "no resolvable instance directory");
        None
    }
}

// ── Job execution ───────────────────────────────────────────────────

/// Execute the benchmark — called inside tokio::spawn.
async fn run_job(state: Arc<AppState>, job_id: String, params: BenchRequest, data_dir: PathBuf) {
    let start = Instant::now();

    match runner::run_benchmark(state.solver.as_ref(), &data_dir, &params).await {
        Ok((results, summary)) => {
            let record_count = results.len();
            state.jobs.update(
                &job_id,
                JobUpdate::Done {
                    results,
                    summary: summary.clone(),
                },
            );
            info!(
                job_id = %job_id,
                records = record_count,
                elapsed_s = start.elapsed().as_secs_f64(),
                "benchmark job done"
            );

            if state.config.bench.history {
                append_history(&state.config.bench.data_dir, &job_id, &params, &summary);
            }
            if state.config.bench.reports {
                if let Some(job) = state.jobs.get(&job_id) {
                    report::persist_job_report(&state.config.bench.report_dir, &job);
                }
            }
        }
        Err(e) => {
            let message = e.to_string();
            state.jobs.update(
                &job_id,
                JobUpdate::Error {
                    message: message.clone(),
                },
            );
            error!(
                job_id = %job_id,
                error = %message,
                elapsed_s = start.elapsed().as_secs_f64(),
                "benchmark job failed"
            );
        }
    }
}

// ── JSONL history ───────────────────────────────────────────────────

/// One line of `<data_dir>/bench/history.jsonl`.
#[derive(Serialize)]
struct HistoryEntry<'a> {
    job_id: &'a str,
    completed_at: DateTime<Utc>,
    params: &'a BenchRequest,
    summary: &'a BenchSummary,
}

/// Append a completion record. Failures are logged and swallowed — the job
/// outcome in the store stays authoritative.
fn append_history(data_dir: &Path, job_id: &str, params: &BenchRequest, summary: &BenchSummary) {
    let log_dir = data_dir.join("bench");
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        warn!(error = %e, "failed to create bench history directory");
        return;
    }
    let log_path = log_dir.join("history.jsonl");

    let entry = HistoryEntry {
        job_id,
        completed_at: Utc::now(),
        params,
        summary,
    };
    let line = match serde_json::to_string(&entry) {
        Ok(l) => l,
        Err(e) => {
            warn!(error = %e, "failed to serialize history entry");
            return;
        }
    };

    // Each line is self-contained, so a plain append is safe.
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);
    match file {
        Ok(mut f) => {
            if let Err(e) = writeln!(f, "{}", line) {
                warn!(error = %e, "failed to write history entry");
            }
        }
        Err(e) => {
            warn!(error = %e, path = %log_path.display(), "failed to open history log");
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use qapbench_core::Config;
    use qapbench_solver::ReferenceSolver;

    fn test_state(data_dir: &Path) -> Arc<AppState> {
        let mut config = Config::from_env();
        config.bench.data_dir = data_dir.to_path_buf();
        config.bench.history = false;
        config.bench.reports = false;
        Arc::new(AppState::new(config, Arc::new(ReferenceSolver::new())))
    }

    fn request(json: &str) -> BenchRequest {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_unsupported_type() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let payload = request(r#"{"type":"tsplib"}"#);
        assert!(start_benchmark_job(&state, payload).is_none());
        assert!(state.jobs.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unresolvable_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        // No <data_dir>/qaplib and no override: nothing to run against.
        assert!(start_benchmark_job(&state, request("{}")).is_none());
    }

    #[tokio::test]
    async fn test_accepts_with_explicit_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let instances = dir.path().join("instances");
        std::fs::create_dir_all(&instances).unwrap();
        std::fs::write(
            instances.join("tiny.dat"),
            "3\n0 1 2\n1 0 1\n2 1 0\n0 5 2\n5 0 3\n2 3 0\n",
        )
        .unwrap();

        let state = test_state(dir.path());
        let payload = request(&format!(
            r#"{{"data_dir":"{}"}}"#,
            instances.display()
        ));
        let job_id = start_benchmark_job(&state, payload).unwrap();
        assert_eq!(job_id, "b-1");

        // Job record exists immediately, Running or already terminal.
        assert!(state.jobs.get(&job_id).is_some());
    }

    #[test]
    fn test_history_entry_shape() {
        let params: BenchRequest = serde_json::from_str("{}").unwrap();
        let summary = BenchSummary::default();
        let entry = HistoryEntry {
            job_id: "b-7",
            completed_at: Utc::now(),
            params: &params,
            summary: &summary,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"job_id\":\"b-7\""));
        assert!(json.contains("completed_at"));
        assert!(json.contains("summary"));
    }

    #[test]
    fn test_append_history_creates_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let params: BenchRequest = serde_json::from_str("{}").unwrap();
        append_history(dir.path(), "b-1", &params, &BenchSummary::default());
        append_history(dir.path(), "b-2", &params, &BenchSummary::default());

        let content =
            std::fs::read_to_string(dir.path().join("bench").join("history.jsonl")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["job_id"], "b-1");
    }
}
