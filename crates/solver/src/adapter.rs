//! Solver adapter boundary.
//!
//! Real QAP backends live outside this workspace; everything behind
//! [`SolverAdapter`] is opaque to the orchestrator. The trait is async so
//! remote backends (HTTP, subprocess) fit without changing the call sites.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::instance::QapProblem;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("invalid problem: {0}")]
    InvalidProblem(String),
}

/// Per-invocation solver parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveParams {
    /// Solver strategy variant (e.g. "hybrid", "nesterov").
    pub mode: String,
    /// Wall-clock budget in seconds.
    pub time_limit: f64,
    /// Backend hint, forwarded opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Robustness epsilon; callers only set this when > 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robust_eps: Option<f64>,
}

impl SolveParams {
    pub fn new(mode: impl Into<String>, time_limit: f64) -> Self {
        Self {
            mode: mode.into(),
            time_limit,
            backend: None,
            robust_eps: None,
        }
    }
}

/// Solver output: achieved objective, optional lower bound, and the
/// assignment that achieved it, plus free-form backend metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub objective: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<f64>,
    pub assignment: Vec<usize>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

/// Pluggable solve capability: `solve(problem, params) -> solution`.
#[async_trait]
pub trait SolverAdapter: Send + Sync {
    /// Identifier reported by /health and job metadata.
    fn name(&self) -> &str;

    async fn solve(&self, problem: &QapProblem, params: &SolveParams)
        -> Result<Solution, SolverError>;
}
