use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("strategy_requests_total", "Total number of strategy requests").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("strategy_cache_hits_total", "Total strategy cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("strategy_cache_misses_total", "Total strategy cache misses").unwrap();
    pub static ref PROVIDER_ERRORS: Counter = register_counter!(
        "strategy_provider_errors_total",
        "Total failed calls to the AI provider"
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "strategy_request_latency_seconds",
        "Strategy request latency in seconds"
    )
    .unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("strategy_cache_size", "Current number of cached strategies").unwrap();
}

// Prometheus text exposition of the default registry
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
