//! Benchmark job data model shared between the runner, store, and API.
//!
//! A job is created `Running` with empty results, then mutated exactly once
//! by its background task: to `Done` with results and summary, or to `Error`
//! with a message. Per-record failures live inside [`InstanceResult::error`]
//! and do not affect the job status.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ── Status ───────────────────────────────────────────────────────────

/// Current status of a benchmark job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Done,
    Error,
}

impl JobStatus {
    /// Terminal states are never left once entered.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

// ── Request payload ──────────────────────────────────────────────────

fn default_bench_type() -> String {
    "qaplib".to_string()
}

/// Accepts either a JSON array of strings or a single comma-separated
/// string (HTML form submissions send the latter).
fn de_string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrSeq {
        Seq(Vec<String>),
        Str(String),
    }

    match StringOrSeq::deserialize(deserializer)? {
        StringOrSeq::Seq(v) => Ok(v),
        StringOrSeq::Str(s) => Ok(s
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()),
    }
}

/// Parameters of a benchmark job, validated at the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchRequest {
    /// Benchmark family. Only "qaplib" is supported.
    #[serde(rename = "type", default = "default_bench_type")]
    pub bench_type: String,
    /// Solver modes to run per instance. Empty means `["hybrid"]`.
    #[serde(default, deserialize_with = "de_string_or_seq")]
    pub modes: Vec<String>,
    /// Comma-separated substrings matched case-insensitively against
    /// instance names. Absent = all discovered instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<String>,
    /// Per-invocation time limit in seconds (default 30).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<f64>,
    /// Backend hint forwarded to the adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Robustness epsilon, forwarded only when > 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robust_eps: Option<f64>,
    /// Instance directory override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

impl BenchRequest {
    /// Requested modes, defaulting to `["hybrid"]` when empty.
    pub fn effective_modes(&self) -> Vec<String> {
        if self.modes.is_empty() {
            vec!["hybrid".to_string()]
        } else {
            self.modes.clone()
        }
    }

    /// Requested time limit, defaulting to 30 seconds.
    pub fn effective_time_limit(&self) -> f64 {
        self.time_limit.unwrap_or(30.0)
    }

    /// Instance filter terms, lowercased. Empty = no filtering.
    pub fn instance_filters(&self) -> Vec<String> {
        self.instances
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

// ── Results ──────────────────────────────────────────────────────────

/// Outcome of one instance × mode invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceResult {
    pub instance: String,
    pub n: usize,
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<f64>,
    pub solve_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_gap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound_gap_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstanceResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Optimality-gap diagnostics: `gap = objective - bound`, normalized by
/// `max(1, |objective|)`. Assumes a minimization objective; a bound above
/// the objective yields a negative gap, kept as-is.
pub fn bound_gap(objective: f64, bound: f64) -> (f64, f64) {
    let gap = objective - bound;
    let gap_pct = gap / objective.abs().max(1.0);
    (gap, gap_pct)
}

/// Coarse size grouping used by the summary report.
pub fn size_bucket(n: usize) -> &'static str {
    if n <= 20 {
        "n<=20"
    } else if n <= 50 {
        "21-50"
    } else {
        "n>50"
    }
}

// ── Summary ──────────────────────────────────────────────────────────

/// Aggregate statistics over the non-error records of one grouping key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeStats {
    pub count: usize,
    pub avg_objective: f64,
    pub avg_solve_time: f64,
}

/// Job-level aggregates: by mode, and by size bucket × mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchSummary {
    pub by_mode: BTreeMap<String, ModeStats>,
    pub by_size: BTreeMap<String, BTreeMap<String, ModeStats>>,
}

// ── Job record ───────────────────────────────────────────────────────

/// One asynchronous benchmark execution tracked by the job store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchJob {
    pub id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub params: BenchRequest,
    #[serde(default)]
    pub results: Vec<InstanceResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<BenchSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lightweight `{id, status, created_at}` projection for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOverview {
    pub id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_serde() {
        for (variant, expected) in [
            (JobStatus::Running, "running"),
            (JobStatus::Done, "done"),
            (JobStatus::Error, "error"),
        ] {
            let json = serde_json::to_string(&variant).unwrap();
            assert_eq!(json, format!("\"{}\"", expected));
            let parsed: JobStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, variant);
        }
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn test_bench_request_modes_from_list() {
        let json = r#"{"type":"qaplib","modes":["hybrid","nesterov"]}"#;
        let req: BenchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.modes, vec!["hybrid", "nesterov"]);
    }

    #[test]
    fn test_bench_request_modes_from_comma_list() {
        let json = r#"{"modes":"hybrid, nesterov,,"}"#;
        let req: BenchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.modes, vec!["hybrid", "nesterov"]);
        assert_eq!(req.bench_type, "qaplib");
    }

    #[test]
    fn test_bench_request_defaults() {
        let req: BenchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.bench_type, "qaplib");
        assert!(req.modes.is_empty());
        assert_eq!(req.effective_modes(), vec!["hybrid"]);
        assert_eq!(req.effective_time_limit(), 30.0);
        assert!(req.instance_filters().is_empty());
    }

    #[test]
    fn test_bench_request_instance_filters_lowercased() {
        let json = r#"{"instances":"Nug12, TAI20A"}"#;
        let req: BenchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.instance_filters(), vec!["nug12", "tai20a"]);
    }

    #[test]
    fn test_bound_gap_positive() {
        let (gap, pct) = bound_gap(100.0, 90.0);
        assert_eq!(gap, 10.0);
        assert_eq!(pct, 0.1);
    }

    #[test]
    fn test_bound_gap_negative_objective() {
        let (gap, pct) = bound_gap(-5.0, -10.0);
        assert_eq!(gap, 5.0);
        assert_eq!(pct, 1.0);
    }

    #[test]
    fn test_bound_gap_small_magnitude_normalizes_by_one() {
        let (gap, pct) = bound_gap(0.5, 0.2);
        assert!((gap - 0.3).abs() < 1e-12);
        assert!((pct - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_bound_gap_negative_kept() {
        let (gap, pct) = bound_gap(80.0, 90.0);
        assert_eq!(gap, -10.0);
        assert_eq!(pct, -0.125);
    }

    #[test]
    fn test_size_bucket_edges() {
        assert_eq!(size_bucket(12), "n<=20");
        assert_eq!(size_bucket(20), "n<=20");
        assert_eq!(size_bucket(21), "21-50");
        assert_eq!(size_bucket(50), "21-50");
        assert_eq!(size_bucket(51), "n>50");
        assert_eq!(size_bucket(256), "n>50");
    }

    #[test]
    fn test_job_serialization_running_has_no_summary() {
        let job = BenchJob {
            id: "b-1".to_string(),
            status: JobStatus::Running,
            created_at: Utc::now(),
            params: serde_json::from_str("{}").unwrap(),
            results: Vec::new(),
            summary: None,
            error: None,
        };
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"status\":\"running\""));
        assert!(!json.contains("summary"));
        assert!(!json.contains("\"error\""));
    }
}
