//! Concurrency-safe registry of benchmark jobs.
//!
//! One coarse mutex guards the whole store, id sequence included: ids come
//! out unique and gapless (`b-1`, `b-2`, ...) no matter how many requests
//! create jobs concurrently. The guard is never held across an await.
//!
//! Retention is bounded: past `max_jobs` records, the oldest *terminal*
//! jobs are evicted at insert time. Running jobs are never evicted, so a
//! spawned task can always land its terminal update. `max_jobs == 0`
//! disables eviction.

use std::sync::Mutex;

use chrono::Utc;
use indexmap::IndexMap;

use qapbench_core::{
    BenchJob, BenchRequest, BenchSummary, InstanceResult, JobOverview, JobStatus,
};

/// Terminal mutation applied by a job's background task, exactly once.
#[derive(Debug)]
pub enum JobUpdate {
    Done {
        results: Vec<InstanceResult>,
        summary: BenchSummary,
    },
    Error {
        message: String,
    },
}

struct StoreInner {
    next_seq: u64,
    jobs: IndexMap<String, BenchJob>,
}

pub struct JobStore {
    inner: Mutex<StoreInner>,
    max_jobs: usize,
}

impl JobStore {
    pub fn new(max_jobs: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                next_seq: 0,
                jobs: IndexMap::new(),
            }),
            max_jobs,
        }
    }

    /// Allocate the next id and insert a `Running` record. Id generation
    /// and insertion happen under one lock acquisition.
    pub fn create(&self, params: BenchRequest) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.next_seq += 1;
        let id = format!("b-{}", inner.next_seq);
        let job = BenchJob {
            id: id.clone(),
            status: JobStatus::Running,
            created_at: Utc::now(),
            params,
            results: Vec::new(),
            summary: None,
            error: None,
        };
        inner.jobs.insert(id.clone(), job);
        self.evict_locked(&mut inner);
        id
    }

    /// Apply the terminal mutation under the lock. A second terminal update
    /// for the same job is ignored: the state machine has exactly one
    /// forward transition.
    pub fn update(&self, id: &str, update: JobUpdate) {
        let mut inner = self.inner.lock().unwrap();
        let Some(job) = inner.jobs.get_mut(id) else {
            tracing::warn!(job_id = %id, "update for unknown job (evicted?)");
            return;
        };
        if job.status.is_terminal() {
            tracing::warn!(job_id = %id, "ignoring second terminal update");
            return;
        }
        match update {
            JobUpdate::Done { results, summary } => {
                job.status = JobStatus::Done;
                job.results = results;
                job.summary = Some(summary);
            }
            JobUpdate::Error { message } => {
                job.status = JobStatus::Error;
                job.error = Some(message);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<BenchJob> {
        self.inner.lock().unwrap().jobs.get(id).cloned()
    }

    /// `{id, status, created_at}` projection in insertion order.
    pub fn list(&self) -> Vec<JobOverview> {
        self.inner
            .lock()
            .unwrap()
            .jobs
            .values()
            .map(|job| JobOverview {
                id: job.id.clone(),
                status: job.status,
                created_at: job.created_at,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_locked(&self, inner: &mut StoreInner) {
        if self.max_jobs == 0 {
            return;
        }
        while inner.jobs.len() > self.max_jobs {
            // Oldest-first scan; only terminal jobs are evictable.
            let victim = inner
                .jobs
                .values()
                .find(|job| job.status.is_terminal())
                .map(|job| job.id.clone());
            match victim {
                Some(id) => {
                    tracing::debug!(job_id = %id, "evicting terminal job past retention cap");
                    inner.jobs.shift_remove(&id);
                }
                None => break,
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
