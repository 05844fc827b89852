//! Synchronous solve endpoint.
//!
//! Accepts either inline `a`/`b` matrices or the name of a discovered
//! instance, runs one adapter invocation while the request waits, and
//! returns the solution enriched with bound-gap diagnostics. The optional
//! request timeout is a race against the adapter task's join handle:
//! on expiry the handler stops waiting and responds 408, but the spawned
//! solve keeps running to completion — best-effort timeout, not preemption.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{FromRequest, Request, State};
use axum::http::{header, StatusCode};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use qapbench_core::bound_gap;
use qapbench_solver::{QapProblem, SolveParams};

use super::error_response;
use crate::state::AppState;

// ── Request / response payloads ─────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SolveRequest {
    /// Label for inline-matrix problems (defaults to "request").
    #[serde(default)]
    pub name: Option<String>,
    /// Flow matrix. Paired with `b`.
    #[serde(default)]
    pub a: Option<Vec<Vec<f64>>>,
    /// Distance matrix. Paired with `a`.
    #[serde(default)]
    pub b: Option<Vec<Vec<f64>>>,
    /// Alternative to inline matrices: a discovered instance name.
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub time_limit: Option<f64>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub robust_eps: Option<f64>,
}

/// Form-encoded variant: every field arrives as a string and numeric
/// fields are normalized leniently. Matrices cannot be expressed in a
/// form body, so this path requires `instance`.
#[derive(Debug, Deserialize)]
pub struct SolveForm {
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub time_limit: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub robust_eps: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl SolveForm {
    fn into_request(self) -> SolveRequest {
        SolveRequest {
            instance: non_empty(self.instance),
            mode: non_empty(self.mode),
            time_limit: non_empty(self.time_limit).and_then(|s| s.parse().ok()),
            backend: non_empty(self.backend),
            robust_eps: non_empty(self.robust_eps).and_then(|s| s.parse().ok()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SolveResponse {
    pub instance: String,
    pub n: usize,
    pub mode: String,
    pub objective: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_gap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_gap_pct: Option<f64>,
    pub solve_time: f64,
    pub assignment: Vec<usize>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn solve(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Json<SolveResponse>, (StatusCode, Json<Value>)> {
    let solve_req = parse_body(&state, req).await?;
    let problem = build_problem(&state, &solve_req)?;

    let mode = solve_req.mode.clone().unwrap_or_else(|| "hybrid".to_string());
    let mut params = SolveParams::new(mode.clone(), solve_req.time_limit.unwrap_or(30.0));
    params.backend = solve_req.backend.clone();
    params.robust_eps = solve_req.robust_eps.filter(|eps| *eps > 0.0);

    let solver = state.solver.clone();
    let task_problem = problem.clone();
    let task_params = params.clone();
    let start = Instant::now();
    let handle =
        tokio::spawn(async move { solver.solve(&task_problem, &task_params).await });

    let joined = match state.config.solve.timeout() {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                // Only the wait is abandoned; the spawned solve runs on.
                tracing::warn!(
                    instance = %problem.name,
                    timeout_s = limit.as_secs_f64(),
                    "solve request timed out"
                );
                return Err(error_response(
                    StatusCode::REQUEST_TIMEOUT,
                    "solve timed out",
                ));
            }
        },
        None => handle.await,
    };

    let solution = joined
        .map_err(|e| {
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("solver task failed: {}", e),
            )
        })?
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;

    let (gap, gap_pct) = match solution.bound {
        Some(bound) => {
            let (g, p) = bound_gap(solution.objective, bound);
            (Some(g), Some(p))
        }
        None => (None, None),
    };

    Ok(Json(SolveResponse {
        instance: problem.name.clone(),
        n: problem.n,
        mode,
        objective: solution.objective,
        bound: solution.bound,
        bound_gap: gap,
        bound_gap_pct: gap_pct,
        solve_time: start.elapsed().as_secs_f64(),
        assignment: solution.assignment,
        metadata: solution.metadata,
    }))
}

// ── Body parsing ────────────────────────────────────────────────────

/// JSON or form-encoded body. Unknown content types fall back to a
/// best-effort JSON parse.
async fn parse_body(
    state: &AppState,
    req: Request,
) -> Result<SolveRequest, (StatusCode, Json<Value>)> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(form) = Form::<SolveForm>::from_request(req, &())
            .await
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;
        return Ok(form.into_request());
    }

    let bytes = axum::body::to_bytes(req.into_body(), state.config.solve.max_body_bytes)
        .await
        .map_err(|_| {
            error_response(StatusCode::PAYLOAD_TOO_LARGE, "request body too large")
        })?;
    serde_json::from_slice(&bytes)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", e)))
}

/// Validate the payload and produce the problem — without touching the
/// adapter on bad input.
fn build_problem(
    state: &AppState,
    req: &SolveRequest,
) -> Result<QapProblem, (StatusCode, Json<Value>)> {
    match (&req.a, &req.b, &req.instance) {
        (Some(a), Some(b), _) => {
            let name = req.name.as_deref().unwrap_or("request");
            QapProblem::from_matrices(name, a.clone(), b.clone())
                .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))
        }
        (None, None, Some(instance)) => load_named_instance(state, instance),
        (Some(_), None, _) | (None, Some(_), _) => Err(error_response(
            StatusCode::BAD_REQUEST,
            "matrices 'a' and 'b' must be supplied together",
        )),
        (None, None, None) => Err(error_response(
            StatusCode::BAD_REQUEST,
            "missing problem: supply matrices 'a' and 'b', or an 'instance' name",
        )),
    }
}

fn load_named_instance(
    state: &AppState,
    instance: &str,
) -> Result<QapProblem, (StatusCode, Json<Value>)> {
    // Instance names map to files; restrict to stem characters.
    if instance.is_empty()
        || !instance
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("invalid instance name: {}", instance),
        ));
    }
    let path = state
        .config
        .bench
        .qaplib_dir()
        .join(format!("{}.dat", instance));
    if !path.is_file() {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            format!("instance not found: {}", instance),
        ));
    }
    let text = std::fs::read_to_string(&path)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?;
    QapProblem::parse(instance, &text)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_normalizes_numeric_fields() {
        let form = SolveForm {
            instance: Some(" nug12 ".to_string()),
            mode: Some("".to_string()),
            time_limit: Some("12.5".to_string()),
            backend: None,
            robust_eps: Some("not-a-number".to_string()),
        };
        let req = form.into_request();
        assert_eq!(req.instance.as_deref(), Some("nug12"));
        assert!(req.mode.is_none());
        assert_eq!(req.time_limit, Some(12.5));
        assert!(req.robust_eps.is_none());
    }

    #[test]
    fn test_solve_request_parses_matrices() {
        let json = r#"{"a":[[0,1],[1,0]],"b":[[0,2],[2,0]],"mode":"nesterov"}"#;
        let req: SolveRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.a.as_ref().unwrap().len(), 2);
        assert_eq!(req.mode.as_deref(), Some("nesterov"));
    }
}
