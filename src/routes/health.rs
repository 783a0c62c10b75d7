//! Liveness endpoint (/health, /healthz)
//!
//! Always 200 while the process is serving. The body reports which store
//! backs the service and which providers are configured, so a missing
//! provider is visible without reading logs.

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::response::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    /// 'online', or 'degraded' when no provider can score
    pub status: &'static str,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// Store backend ("mongodb" or "memory")
    pub store: &'static str,
    pub providers: Vec<String>,
    pub similarity_provider: String,
    pub scoring_workers: usize,
    pub dev_mode: bool,
    pub timestamp: String,
}

pub fn build_health_response(state: &AppState) -> HealthResponse {
    let providers: Vec<String> = state.providers.kinds().iter().map(|k| k.to_string()).collect();
    let status = if state.providers.similarity().is_some() {
        "online"
    } else {
        "degraded"
    };

    HealthResponse {
        healthy: true,
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        store: state.store.kind(),
        providers,
        similarity_provider: state.args.providers.similarity_provider.to_string(),
        scoring_workers: state.queue.worker_count(),
        dev_mode: state.args.dev_mode,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

pub fn health_check(state: &AppState) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(state))
}
