//! Health check HTTP handler

use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::services::CacheStats;
use crate::web::{AppState, responses::ok};

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub cache: CacheStats,
}

/// Health check endpoint
///
/// Reports liveness plus the resolver's cache counters
pub async fn health_check(State(state): State<AppState>) -> Response {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cache: state.resolver.cache_stats().await,
    })
}
