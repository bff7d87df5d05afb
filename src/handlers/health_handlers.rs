//! Liveness and readiness probes.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Serialize)]
pub struct Liveness {
    status: &'static str,
}

/// Outcome of one dependency check.
#[derive(Debug, Serialize, PartialEq)]
pub struct Check {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<Result<(), String>> for Check {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self { ok: true, error: None },
            Err(error) => Self {
                ok: false,
                error: Some(error),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    sqlite: Check,
    disk: Check,
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    status: &'static str,
    checks: ReadinessChecks,
}

impl Readiness {
    fn new(sqlite: Check, disk: Check) -> Self {
        let status = if sqlite.ok && disk.ok { "ok" } else { "error" };
        Self {
            status,
            checks: ReadinessChecks { sqlite, disk },
        }
    }

    fn status_code(&self) -> StatusCode {
        if self.status == "ok" {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET `/healthz`: always 200, no I/O.
pub async fn healthz() -> Json<Liveness> {
    Json(Liveness { status: "ok" })
}

/// GET `/readyz`: 200 when the metadata database answers and the upload
/// root accepts a write/read/delete round trip, 503 otherwise.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let sqlite = Check::from(ping(&state.tree.db).await);
    let disk = Check::from(state.tree.store.probe().await);

    let readiness = Readiness::new(sqlite, disk);
    if readiness.status_code() != StatusCode::OK {
        tracing::warn!(?readiness, "readiness check failed");
    }
    (readiness.status_code(), Json(readiness))
}

async fn ping(db: &SqlitePool) -> Result<(), String> {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(db).await {
        Ok(1) => Ok(()),
        Ok(v) => Err(format!("unexpected result: {}", v)),
        Err(e) => Err(format!("query failed: {}", e)),
    }
}
