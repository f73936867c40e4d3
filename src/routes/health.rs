//! Health check endpoints
//!
//! - /health, /healthz - liveness probe
//! - /ready, /readyz   - readiness probe (store backend reachable)
//! - /version          - build info for deployment verification

use chrono::Utc;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::routes::helpers::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub uptime: u64,
    pub mode: String,
    pub node_id: String,
    pub database: DatabaseHealth,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    /// False when running on the in-memory dev store
    pub connected: bool,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit: &'static str,
    pub built: &'static str,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.uptime_secs(),
        mode: if state.args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
        node_id: state.args.node_id.to_string(),
        database: DatabaseHealth {
            connected: state.mongo_connected,
        },
        timestamp: Utc::now().to_rfc3339(),
    }
}

/// Liveness: 200 whenever the process is serving.
pub fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(&state))
}

/// Readiness: 200 when a store backend is available. The in-memory dev
/// store always counts as ready.
pub fn readiness_check(state: Arc<AppState>) -> Response<BoxBody> {
    let ready = state.mongo_connected || state.args.dev_mode;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    json_response(status, &build_health_response(&state))
}

pub fn version_info() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            commit: env!("GIT_COMMIT_SHORT"),
            built: env!("BUILD_TIMESTAMP"),
        },
    )
}
