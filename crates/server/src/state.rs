use std::sync::Arc;

use qapbench_core::Config;
use qapbench_solver::SolverAdapter;

use crate::bench::store::JobStore;

/// Shared application state: configuration, the job registry, and the
/// solver adapter. The [`JobStore`] is the only mutable piece; everything
/// else is read-only after startup.
pub struct AppState {
    pub config: Config,
    pub jobs: JobStore,
    pub solver: Arc<dyn SolverAdapter>,
}

impl AppState {
    pub fn new(config: Config, solver: Arc<dyn SolverAdapter>) -> Self {
        let jobs = JobStore::new(config.bench.max_jobs);
        Self {
            config,
            jobs,
            solver,
        }
    }
}
