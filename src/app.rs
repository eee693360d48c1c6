use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers::{
    cache_clear_handler, cache_health_handler, cache_stats_handler, generate_handler,
    health_handler, metrics_handler,
};
use crate::state::AppState;

pub fn router(state: Arc<AppState>, origins: &[String]) -> Router {
    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/ai/generate-strategy", post(generate_handler))
        .route("/v1/ai/cache/stats", get(cache_stats_handler))
        .route("/v1/ai/cache/clear", delete(cache_clear_handler))
        .route("/v1/ai/cache/health", get(cache_health_handler));

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(metrics_handler))
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Credentialed CORS needs explicit origins, so methods and headers mirror the request
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            // tower-http panics on a wildcard next to allow_credentials
            Ok(value) if value == "*" => {
                warn!("wildcard CORS origin cannot be combined with credentials, ignoring");
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
