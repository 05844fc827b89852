//! HTTP endpoint handlers.

pub mod bench;
pub mod health;
pub mod solve;
pub mod ui;

pub use bench::{bench_create, bench_csv, bench_get, bench_summary};
pub use health::health;
pub use solve::solve;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// Uniform `{error}` body for error responses.
pub(crate) fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

pub(crate) fn not_found(message: impl Into<String>) -> (StatusCode, Json<Value>) {
    error_response(StatusCode::NOT_FOUND, message)
}
