//! QAPLIB instance discovery and loading.
//!
//! Instance files follow the QAPLIB `.dat` layout: the problem order `n`,
//! then `n*n` flow entries, then `n*n` distance entries, all
//! whitespace-separated. Discovery only peeks at the leading `n`; the full
//! matrices are read lazily when a solve actually needs them.

use std::path::{Path, PathBuf};

use qapbench_core::QapBenchError;

/// A discovered instance: name, size, and where to load it from.
#[derive(Debug, Clone)]
pub struct QapInstance {
    pub name: String,
    pub n: usize,
    pub path: PathBuf,
}

impl QapInstance {
    /// Load the full problem (both matrices) from disk.
    pub fn load(&self) -> Result<QapProblem, QapBenchError> {
        let text = std::fs::read_to_string(&self.path)?;
        QapProblem::parse(&self.name, &text)
    }
}

/// A fully loaded problem: flow matrix `a`, distance matrix `b`.
#[derive(Debug, Clone)]
pub struct QapProblem {
    pub name: String,
    pub n: usize,
    pub a: Vec<Vec<f64>>,
    pub b: Vec<Vec<f64>>,
}

impl QapProblem {
    /// Parse the QAPLIB text layout: `n`, then two `n x n` matrices.
    pub fn parse(name: &str, text: &str) -> Result<Self, QapBenchError> {
        let mut tokens = text.split_whitespace();

        let n: usize = tokens
            .next()
            .ok_or_else(|| parse_err(name, "empty file"))?
            .parse()
            .map_err(|_| parse_err(name, "first token is not a problem size"))?;
        if n == 0 {
            return Err(parse_err(name, "problem size is zero"));
        }

        let mut read_matrix = |label: &str| -> Result<Vec<Vec<f64>>, QapBenchError> {
            let mut rows = Vec::with_capacity(n);
            for i in 0..n {
                let mut row = Vec::with_capacity(n);
                for j in 0..n {
                    let tok = tokens.next().ok_or_else(|| {
                        parse_err(name, &format!("{} matrix truncated at ({}, {})", label, i, j))
                    })?;
                    let v: f64 = tok.parse().map_err(|_| {
                        parse_err(name, &format!("bad {} entry '{}' at ({}, {})", label, tok, i, j))
                    })?;
                    row.push(v);
                }
                rows.push(row);
            }
            Ok(rows)
        };

        let a = read_matrix("flow")?;
        let b = read_matrix("distance")?;

        Ok(Self {
            name: name.to_string(),
            n,
            a,
            b,
        })
    }

    /// Build a problem directly from matrices (the synchronous solve path
    /// receives them in the request body). Both must be square and of
    /// matching order.
    pub fn from_matrices(
        name: &str,
        a: Vec<Vec<f64>>,
        b: Vec<Vec<f64>>,
    ) -> Result<Self, QapBenchError> {
        let n = a.len();
        if n == 0 {
            return Err(parse_err(name, "empty flow matrix"));
        }
        if b.len() != n {
            return Err(parse_err(
                name,
                &format!("matrix order mismatch: A is {}, B is {}", n, b.len()),
            ));
        }
        for (label, m) in [("flow", &a), ("distance", &b)] {
            if let Some(row) = m.iter().find(|row| row.len() != n) {
                return Err(parse_err(
                    name,
                    &format!("{} matrix is not square ({} columns in a row of order {})", label, row.len(), n),
                ));
            }
        }
        Ok(Self {
            name: name.to_string(),
            n,
            a,
            b,
        })
    }

    /// Objective of an assignment: `sum a[i][j] * b[p(i)][p(j)]`.
    pub fn objective(&self, assignment: &[usize]) -> f64 {
        let mut total = 0.0;
        for i in 0..self.n {
            for j in 0..self.n {
                total += self.a[i][j] * self.b[assignment[i]][assignment[j]];
            }
        }
        total
    }
}

fn parse_err(file: &str, message: &str) -> QapBenchError {
    QapBenchError::Parse {
        file: file.to_string(),
        message: message.to_string(),
    }
}

/// Peek the leading `n` of an instance file without reading the matrices.
fn peek_size(path: &Path) -> Option<usize> {
    let text = std::fs::read_to_string(path).ok()?;
    text.split_whitespace().next()?.parse().ok()
}

/// List `.dat` instances in `data_dir`, sorted by name, optionally filtered
/// by case-insensitive substring terms (a file matches if any term matches).
/// Unreadable files are skipped with a warning rather than failing the scan.
pub fn discover_instances(
    data_dir: &Path,
    filters: &[String],
) -> Result<Vec<QapInstance>, QapBenchError> {
    if !data_dir.is_dir() {
        return Err(QapBenchError::InstanceNotFound(format!(
            "instance directory not found: {}",
            data_dir.display()
        )));
    }

    let mut instances = Vec::new();
    for entry in walkdir::WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || path.extension().map(|e| e != "dat").unwrap_or(true) {
            continue;
        }
        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => continue,
        };
        if !filters.is_empty() {
            let lower = name.to_lowercase();
            if !filters.iter().any(|f| lower.contains(f.as_str())) {
                continue;
            }
        }
        match peek_size(path) {
            Some(n) if n > 0 => instances.push(QapInstance {
                name,
                n,
                path: path.to_path_buf(),
            }),
            _ => {
                tracing::warn!(path = %path.display(), "skipping unreadable instance file");
            }
        }
    }

    instances.sort_by(|x, y| x.name.cmp(&y.name));
    Ok(instances)
}

// ── Tests ────────────────────────────────────────────────────────────
