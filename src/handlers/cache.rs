use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::auth::AuthUser;
use crate::cache::CacheStatistics;
use crate::metrics::CACHE_SIZE;
use crate::models::{CacheHealthResponse, ClearResponse};
use crate::state::AppState;

pub async fn cache_stats_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Json<CacheStatistics> {
    let stats = state.cache.stats();
    CACHE_SIZE.set(stats.total_entries as f64);
    info!(requested_by = user.label(), "cache stats requested");
    Json(stats)
}

pub async fn cache_clear_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Json<ClearResponse> {
    let cleared = state.cache.clear();
    CACHE_SIZE.set(0.0);
    info!(cleared_by = user.label(), cleared, "strategy cache cleared");

    Json(ClearResponse {
        message: "Cache cleared successfully".to_string(),
        cleared_entries: cleared,
        cleared_by: user.label().to_string(),
        timestamp: Utc::now(),
    })
}

// Public: no entry contents, only aggregate numbers
pub async fn cache_health_handler(
    State(state): State<Arc<AppState>>,
) -> Json<CacheHealthResponse> {
    let stats = state.cache.stats();
    CACHE_SIZE.set(stats.total_entries as f64);
    Json(stats.into())
}
