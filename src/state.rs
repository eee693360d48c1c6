use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::cache::StrategyCache;
use crate::provider::StrategyProvider;
use crate::rate_limit::RateLimiter;

// app's shared state, built once in main and handed to every handler
pub struct AppState {
    pub cache: StrategyCache,
    pub provider: Arc<dyn StrategyProvider>,
    pub rate_limiter: RateLimiter,
    pub jwt: JwtKeys,
}
