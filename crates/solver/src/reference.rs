//! Built-in reference adapter.
//!
//! A cheap deterministic heuristic that stands in for external QAP backends
//! so the server runs and tests end-to-end without one: greedy pairwise-swap
//! descent from the identity assignment, with a rearrangement-inequality
//! lower bound. All modes run the same descent; the requested mode and
//! backend hint are echoed back through the solution metadata.

use std::time::Instant;

use async_trait::async_trait;

use crate::adapter::{SolveParams, Solution, SolverAdapter, SolverError};
use crate::instance::QapProblem;

#[derive(Debug, Default)]
pub struct ReferenceSolver;

impl ReferenceSolver {
    pub fn new() -> Self {
        Self
    }
}

/// Lower bound from the rearrangement inequality: pairing the smallest flow
/// entries with the largest distance entries underestimates every
/// permutation's objective.
fn rearrangement_bound(problem: &QapProblem) -> f64 {
    let mut flows: Vec<f64> = problem.a.iter().flatten().copied().collect();
    let mut dists: Vec<f64> = problem.b.iter().flatten().copied().collect();
    flows.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    dists.sort_by(|x, y| y.partial_cmp(x).unwrap_or(std::cmp::Ordering::Equal));
    flows.iter().zip(dists.iter()).map(|(f, d)| f * d).sum()
}

#[async_trait]
impl SolverAdapter for ReferenceSolver {
    fn name(&self) -> &str {
        "reference-heuristic"
    }

    async fn solve(
        &self,
        problem: &QapProblem,
        params: &SolveParams,
    ) -> Result<Solution, SolverError> {
        let n = problem.n;
        if n == 0 {
            return Err(SolverError::InvalidProblem("problem of order zero".into()));
        }

        let start = Instant::now();
        let budget = if params.time_limit > 0.0 {
            params.time_limit
        } else {
            30.0
        };

        let mut assignment: Vec<usize> = (0..n).collect();
        let mut objective = problem.objective(&assignment);
        let mut sweeps = 0u64;

        // First-improvement swap descent until a full sweep finds nothing.
        loop {
            let mut improved = false;
            'sweep: for i in 0..n {
                for j in (i + 1)..n {
                    assignment.swap(i, j);
                    let candidate = problem.objective(&assignment);
                    if candidate < objective {
                        objective = candidate;
                        improved = true;
                        break 'sweep;
                    }
                    assignment.swap(i, j);
                }
            }
            sweeps += 1;
            if !improved || start.elapsed().as_secs_f64() > budget {
                break;
            }
        }

        Ok(Solution {
            objective,
            bound: Some(rearrangement_bound(problem)),
            assignment,
            metadata: serde_json::json!({
                "solver": self.name(),
                "mode": params.mode,
                "backend": params.backend,
                "robust_eps": params.robust_eps,
                "sweeps": sweeps,
            }),
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────────
