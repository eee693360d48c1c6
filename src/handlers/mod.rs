mod cache;
mod generate;
mod health;
mod metrics;

pub use cache::{cache_clear_handler, cache_health_handler, cache_stats_handler};
pub use generate::generate_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
