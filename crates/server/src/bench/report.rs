//! Job page rendering and static report persistence.
//!
//! The live detail view and the persisted per-job report share one
//! template; the report variant adds a generation timestamp. Persistence is
//! best-effort throughout: a render or write failure is logged and the job
//! record is left untouched.

use std::path::Path;

use chrono::Utc;
use minijinja::context;
use serde::Serialize;
use tracing::warn;

use qapbench_core::BenchJob;

use crate::bench::templates;

/// One bar of the per-mode average-objective chart.
#[derive(Debug, Serialize)]
struct Bar {
    mode: String,
    avg: f64,
    count: usize,
    /// Width relative to the largest average, in percent.
    pct: f64,
}

fn bars_for(job: &BenchJob) -> Vec<Bar> {
    let Some(summary) = &job.summary else {
        return Vec::new();
    };
    let max_avg = summary
        .by_mode
        .values()
        .map(|s| s.avg_objective.abs())
        .fold(0.0_f64, f64::max);
    summary
        .by_mode
        .iter()
        .map(|(mode, stats)| Bar {
            mode: mode.clone(),
            avg: stats.avg_objective,
            count: stats.count,
            pct: if max_avg > 0.0 {
                (stats.avg_objective.abs() / max_avg * 100.0).min(100.0)
            } else {
                0.0
            },
        })
        .collect()
}

/// Render the job detail page. `standalone` marks a persisted report and
/// stamps it with a generation time.
pub fn render_job_page(job: &BenchJob, standalone: bool) -> Result<String, minijinja::Error> {
    let generated_at = standalone.then(|| Utc::now().to_rfc3339());
    templates::env().get_template("detail")?.render(context! {
        job => job,
        bars => bars_for(job),
        generated_at => generated_at,
    })
}

/// Write `<report_dir>/<job_id>.html` and refresh the index. Best-effort.
pub fn persist_job_report(report_dir: &Path, job: &BenchJob) {
    if let Err(e) = std::fs::create_dir_all(report_dir) {
        warn!(error = %e, "failed to create report directory");
        return;
    }

    let page = match render_job_page(job, true) {
        Ok(p) => p,
        Err(e) => {
            warn!(job_id = %job.id, error = %e, "failed to render report");
            return;
        }
    };
    let path = report_dir.join(format!("{}.html", job.id));
    if let Err(e) = std::fs::write(&path, page) {
        warn!(job_id = %job.id, error = %e, path = %path.display(), "failed to write report");
        return;
    }

    regenerate_index(report_dir);
}

#[derive(Debug, Serialize)]
struct IndexRow {
    id: String,
    modified: String,
}

/// Rebuild `index.html` from the reports on disk, newest first.
fn regenerate_index(report_dir: &Path) {
    let entries = match std::fs::read_dir(report_dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "failed to list report directory");
            return;
        }
    };

    let mut rows: Vec<(std::time::SystemTime, IndexRow)> = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem == "index" || path.extension().map(|e| e != "html").unwrap_or(true) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::UNIX_EPOCH);
        rows.push((
            modified,
            IndexRow {
                id: stem.to_string(),
                modified: chrono::DateTime::<Utc>::from(modified).to_rfc3339(),
            },
        ));
    }
    rows.sort_by(|a, b| b.0.cmp(&a.0));
    let reports: Vec<IndexRow> = rows.into_iter().map(|(_, row)| row).collect();

    let page = match templates::env()
        .get_template("index")
        .and_then(|t| t.render(context! { reports => reports }))
    {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "failed to render report index");
            return;
        }
    };
    if let Err(e) = std::fs::write(report_dir.join("index.html"), page) {
        warn!(error = %e, "failed to write report index");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use qapbench_core::{BenchSummary, InstanceResult, JobStatus, ModeStats};

    fn done_job() -> BenchJob {
        let mut summary = BenchSummary::default();
        summary.by_mode.insert(
            "hybrid".to_string(),
            ModeStats {
                count: 2,
                avg_objective: 120.0,
                avg_solve_time: 0.5,
            },
        );
        summary.by_mode.insert(
            "nesterov".to_string(),
            ModeStats {
                count: 2,
                avg_objective: 60.0,
                avg_solve_time: 0.7,
            },
        );
        BenchJob {
            id: "b-1".to_string(),
            status: JobStatus::Done,
            created_at: Utc::now(),
            params: serde_json::from_str("{}").unwrap(),
            results: vec![InstanceResult {
                instance: "nug12".to_string(),
                n: 12,
                mode: "hybrid".to_string(),
                objective: Some(578.0),
                solve_time: 0.42,
                bound: Some(500.0),
                bound_gap: Some(78.0),
                bound_gap_pct: Some(78.0 / 578.0),
                error: None,
            }],
            summary: Some(summary),
            error: None,
        }
    }

    #[test]
    fn test_bars_scaled_to_largest_average() {
        let bars = bars_for(&done_job());
        assert_eq!(bars.len(), 2);
        let hybrid = bars.iter().find(|b| b.mode == "hybrid").unwrap();
        let nesterov = bars.iter().find(|b| b.mode == "nesterov").unwrap();
        assert_eq!(hybrid.pct, 100.0);
        assert_eq!(nesterov.pct, 50.0);
    }

    #[test]
    fn test_render_detail_contains_results() {
        let html = render_job_page(&done_job(), false).unwrap();
        assert!(html.contains("Job b-1"));
        assert!(html.contains("nug12"));
        assert!(html.contains("578"));
        assert!(!html.contains("report generated"));
    }

    #[test]
    fn test_render_standalone_stamps_generation_time() {
        let html = render_job_page(&done_job(), true).unwrap();
        assert!(html.contains("report generated"));
    }

    #[test]
    fn test_persist_writes_report_and_index() {
        let dir = tempfile::tempdir().unwrap();
        persist_job_report(dir.path(), &done_job());

        assert!(dir.path().join("b-1.html").is_file());
        let index = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(index.contains("/bench/reports/b-1"));
    }

    #[test]
    fn test_render_running_job_without_summary() {
        let job = BenchJob {
            id: "b-9".to_string(),
            status: JobStatus::Running,
            created_at: Utc::now(),
            params: serde_json::from_str("{}").unwrap(),
            results: Vec::new(),
            summary: None,
            error: None,
        };
        let html = render_job_page(&job, false).unwrap();
        assert!(html.contains("running"));
        assert!(!html.contains("Average objective"));
    }
}
