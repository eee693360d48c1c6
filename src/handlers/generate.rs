use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, CACHE_SIZE, REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{StrategyRequest, StrategyResponse};
use crate::provider::strategy_prompt;
use crate::state::AppState;

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<StrategyRequest>, JsonRejection>,
) -> Result<Json<StrategyResponse>, ApiError> {
    REQUEST_TOTAL.inc();
    let Json(payload) = payload?;
    payload.validate()?;

    let start_time = Instant::now();

    // check cache first
    if let Some(entry) = state.cache.lookup(&payload.industry, &payload.objective) {
        CACHE_HITS.inc();
        debug!(user = user.label(), hits = entry.hit_count, "strategy served from cache");
        REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
        return Ok(Json(StrategyResponse {
            strategy: entry.strategy,
            cached: true,
            cache_timestamp: Some(entry.created_at),
        }));
    }
    CACHE_MISSES.inc();

    // only provider calls count against the quota
    if !state.rate_limiter.check(&user.0.sub) {
        return Err(ApiError::RateLimited {
            retry_after: state.rate_limiter.retry_after_secs(&user.0.sub),
        });
    }

    let prompt = strategy_prompt(&payload.industry, &payload.objective);
    let strategy = state.provider.generate(&prompt).await?;

    state
        .cache
        .store(&payload.industry, &payload.objective, strategy.clone());
    CACHE_SIZE.set(state.cache.stats().total_entries as f64);

    info!(
        user = user.label(),
        industry = %payload.industry,
        objective = %payload.objective,
        "strategy generated"
    );
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    Ok(Json(StrategyResponse {
        strategy,
        cached: false,
        cache_timestamp: Some(Utc::now()),
    }))
}
