use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub solve: SolveConfig,
    pub bench: BenchConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            solve: SolveConfig::from_env(),
            bench: BenchConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:  host={}, port={}", self.server.host, self.server.port);
        tracing::info!(
            "  solve:   max_body_bytes={}, timeout={}",
            self.solve.max_body_bytes,
            match self.solve.timeout() {
                Some(d) => format!("{}s", d.as_secs()),
                None => "none".to_string(),
            }
        );
        tracing::info!(
            "  bench:   data_dir={}, history={}, reports={}, max_jobs={}",
            self.bench.data_dir.display(),
            self.bench.history,
            self.bench.reports,
            self.bench.max_jobs
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 3001),
            cors_origin: env_or("CORS_ORIGIN", "*"),
        }
    }
}

// ── Synchronous solve path ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveConfig {
    /// Maximum accepted request body size in bytes (413 beyond this).
    pub max_body_bytes: usize,
    /// Wall-clock timeout for a synchronous solve in seconds (0 = none).
    pub timeout_secs: u64,
}

impl SolveConfig {
    fn from_env() -> Self {
        Self {
            max_body_bytes: env_usize("MAX_BODY_BYTES", 2 * 1024 * 1024),
            timeout_secs: env_u64("SOLVE_TIMEOUT_SECS", 0),
        }
    }

    /// The configured solve timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

// ── Benchmark jobs ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Root data directory. QAPLIB instances live under `<data_dir>/qaplib`
    /// unless a request supplies its own `data_dir`.
    pub data_dir: PathBuf,
    /// Append a JSONL history record when a job completes.
    pub history: bool,
    /// Render a static HTML report per completed job.
    pub reports: bool,
    /// Directory for static HTML reports.
    pub report_dir: PathBuf,
    /// Retain at most this many jobs in memory; the oldest terminal jobs
    /// are evicted first. 0 disables eviction.
    pub max_jobs: usize,
}

impl BenchConfig {
    fn from_env() -> Self {
        Self {
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            history: env_bool("BENCH_HISTORY", true),
            reports: env_bool("BENCH_REPORTS", false),
            report_dir: PathBuf::from(env_or("REPORT_DIR", "reports")),
            max_jobs: env_usize("BENCH_MAX_JOBS", 256),
        }
    }

    /// Default QAPLIB instance directory.
    pub fn qaplib_dir(&self) -> PathBuf {
        self.data_dir.join("qaplib")
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_timeout_disabled_at_zero() {
        let cfg = SolveConfig { max_body_bytes: 1024, timeout_secs: 0 };
        assert!(cfg.timeout().is_none());
    }

    #[test]
    fn test_solve_timeout_enabled() {
        let cfg = SolveConfig { max_body_bytes: 1024, timeout_secs: 15 };
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_qaplib_dir_under_data_dir() {
        let cfg = BenchConfig {
            data_dir: PathBuf::from("/srv/data"),
            history: true,
            reports: false,
            report_dir: PathBuf::from("reports"),
            max_jobs: 256,
        };
        assert_eq!(cfg.qaplib_dir(), PathBuf::from("/srv/data/qaplib"));
    }
}
