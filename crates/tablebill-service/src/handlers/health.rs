//! Liveness endpoint for load balancers and the dashboard's status page.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
///
/// `now` is the instant the service bills against; a drift from wall time
/// there means a pinned clock leaked outside tests.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process answers.
    pub status: &'static str,
    /// `"tablebill"`.
    pub service: &'static str,
    /// Crate version of the running binary.
    pub version: &'static str,
    /// The service clock's current instant.
    pub now: DateTime<Utc>,
}

/// Report that the process is up. No store round trip and no API key.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "tablebill",
        version: env!("CARGO_PKG_VERSION"),
        now: state.clock.now(),
    })
}
