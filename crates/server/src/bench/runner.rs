//! Benchmark runner: instance discovery × modes execution.
//!
//! Every instance × mode invocation is independent — a failing pair is
//! captured in its own result record and excluded from averages, never
//! aborting siblings. Results are appended in discovery order (sorted
//! instance names, then the requested mode order), so a fixed directory
//! listing yields a deterministic result sequence.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use qapbench_core::{
    bound_gap, size_bucket, BenchRequest, BenchSummary, InstanceResult, ModeStats,
};
use qapbench_solver::{discover_instances, QapInstance, SolveParams, SolverAdapter};

/// Run the full benchmark described by `params` against `data_dir`.
///
/// Errors returned here are job-level (e.g. the instance directory is
/// unreadable) and fail the whole job; per-pair solver failures are data,
/// not errors.
pub async fn run_benchmark(
    solver: &dyn SolverAdapter,
    data_dir: &Path,
    params: &BenchRequest,
) -> anyhow::Result<(Vec<InstanceResult>, BenchSummary)> {
    let filters = params.instance_filters();
    let instances = discover_instances(data_dir, &filters)?;
    let modes = params.effective_modes();

    tracing::info!(
        instances = instances.len(),
        modes = modes.len(),
        data_dir = %data_dir.display(),
        "benchmark run starting"
    );

    let mut results = Vec::with_capacity(instances.len() * modes.len());
    for instance in &instances {
        let problem = instance.load();
        for mode in &modes {
            match &problem {
                Ok(problem) => {
                    let solve_params = build_params(params, mode);
                    let start = Instant::now();
                    let record = match solver.solve(problem, &solve_params).await {
                        Ok(solution) => {
                            ok_record(instance, mode, solution.objective, solution.bound, start)
                        }
                        Err(e) => err_record(instance, mode, e.to_string(), start),
                    };
                    results.push(record);
                }
                // Unloadable instance: every mode pair fails with the load error.
                Err(e) => {
                    results.push(err_record(
                        instance,
                        mode,
                        e.to_string(),
                        Instant::now(),
                    ));
                }
            }
        }
    }

    let failed = results.iter().filter(|r| !r.is_ok()).count();
    tracing::info!(
        records = results.len(),
        failed = failed,
        "benchmark run finished"
    );

    let summary = summarize(&results);
    Ok((results, summary))
}

fn build_params(params: &BenchRequest, mode: &str) -> SolveParams {
    let mut solve_params = SolveParams::new(mode, params.effective_time_limit());
    solve_params.backend = params.backend.clone();
    solve_params.robust_eps = params.robust_eps.filter(|eps| *eps > 0.0);
    solve_params
}

fn ok_record(
    instance: &QapInstance,
    mode: &str,
    objective: f64,
    bound: Option<f64>,
    start: Instant,
) -> InstanceResult {
    let (gap, gap_pct) = match bound {
        Some(b) => {
            let (g, p) = bound_gap(objective, b);
            (Some(g), Some(p))
        }
        None => (None, None),
    };
    InstanceResult {
        instance: instance.name.clone(),
        n: instance.n,
        mode: mode.to_string(),
        objective: Some(objective),
        solve_time: start.elapsed().as_secs_f64(),
        bound,
        bound_gap: gap,
        bound_gap_pct: gap_pct,
        error: None,
    }
}

fn err_record(instance: &QapInstance, mode: &str, error: String, start: Instant) -> InstanceResult {
    InstanceResult {
        instance: instance.name.clone(),
        n: instance.n,
        mode: mode.to_string(),
        objective: None,
        solve_time: start.elapsed().as_secs_f64(),
        bound: None,
        bound_gap: None,
        bound_gap_pct: None,
        error: Some(error),
    }
}

/// Aggregate non-error records by mode and by size bucket × mode.
pub fn summarize(results: &[InstanceResult]) -> BenchSummary {
    #[derive(Default)]
    struct Acc {
        count: usize,
        objective_sum: f64,
        time_sum: f64,
    }

    impl Acc {
        fn push(&mut self, objective: f64, solve_time: f64) {
            self.count += 1;
            self.objective_sum += objective;
            self.time_sum += solve_time;
        }

        fn stats(&self) -> ModeStats {
            ModeStats {
                count: self.count,
                avg_objective: self.objective_sum / self.count as f64,
                avg_solve_time: self.time_sum / self.count as f64,
            }
        }
    }

    let mut by_mode: BTreeMap<String, Acc> = BTreeMap::new();
    let mut by_size: BTreeMap<String, BTreeMap<String, Acc>> = BTreeMap::new();

    for record in results {
        let Some(objective) = record.objective else {
            continue;
        };
        by_mode
            .entry(record.mode.clone())
            .or_default()
            .push(objective, record.solve_time);
        by_size
            .entry(size_bucket(record.n).to_string())
            .or_default()
            .entry(record.mode.clone())
            .or_default()
            .push(objective, record.solve_time);
    }

    BenchSummary {
        by_mode: by_mode.iter().map(|(k, a)| (k.clone(), a.stats())).collect(),
        by_size: by_size
            .iter()
            .map(|(bucket, modes)| {
                (
                    bucket.clone(),
                    modes.iter().map(|(k, a)| (k.clone(), a.stats())).collect(),
                )
            })
            .collect(),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
