use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::TimeDelta;
use serde_json::{Value, json};
use tower::ServiceExt;

use strategy_gateway::app;
use strategy_gateway::auth::JwtKeys;
use strategy_gateway::cache::StrategyCache;
use strategy_gateway::clock::ManualClock;
use strategy_gateway::provider::{ProviderError, StrategyProvider};
use strategy_gateway::rate_limit::RateLimiter;
use strategy_gateway::state::AppState;

const SECRET: &str = "integration-secret";

enum Behaviour {
    Echo,
    Quota,
    Unconfigured,
}

struct FakeProvider {
    calls: AtomicUsize,
    behaviour: Behaviour,
}

#[async_trait]
impl StrategyProvider for FakeProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.behaviour {
            Behaviour::Echo => Ok(format!("strategy #{n} ({} chars of prompt)", prompt.len())),
            Behaviour::Quota => Err(ProviderError::QuotaExceeded("quota exceeded".into())),
            Behaviour::Unconfigured => Err(ProviderError::NotConfigured),
        }
    }
}

struct Harness {
    router: Router,
    provider: Arc<FakeProvider>,
    clock: Arc<ManualClock>,
    token: String,
}

fn harness_with(behaviour: Behaviour, rate_limit: u32) -> Harness {
    let provider = Arc::new(FakeProvider {
        calls: AtomicUsize::new(0),
        behaviour,
    });
    let clock = Arc::new(ManualClock::default());
    let jwt = JwtKeys::new(SECRET, 60);
    let token = jwt.issue("user-1", Some("admin@example.com".into()), Some("admin".into()));

    let state = Arc::new(AppState {
        cache: StrategyCache::with_clock(Duration::from_secs(3600), clock.clone()),
        provider: provider.clone(),
        rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        jwt,
    });
    let router = app::router(state, &["http://localhost:3000".to_string()]);

    Harness {
        router,
        provider,
        clock,
        token,
    }
}

fn harness() -> Harness {
    harness_with(Behaviour::Echo, 100)
}

impl Harness {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        auth: bool,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if auth {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn generate(&self, industry: &str, objective: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/v1/ai/generate-strategy",
            Some(json!({ "industry": industry, "objective": objective })),
            true,
        )
        .await
    }

    fn provider_calls(&self) -> usize {
        self.provider.calls.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let h = harness();

    let (status, first) = h.generate("E-commerce", "Grow Sales").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["cached"], false);
    assert!(first["cache_timestamp"].is_string());

    let (status, second) = h.generate("e-commerce  ", "  grow sales").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cached"], true);
    assert_eq!(second["strategy"], first["strategy"]);
    assert_eq!(h.provider_calls(), 1);

    let (_, stats) = h.send(Method::GET, "/api/v1/ai/cache/stats", None, true).await;
    assert_eq!(stats["total_entries"], 1);
    assert_eq!(stats["cache_hits"], 1);
    assert_eq!(stats["cache_misses"], 1);
    assert_eq!(stats["hit_ratio"], 0.5);
}

#[tokio::test]
async fn expired_entry_is_regenerated() {
    let h = harness();

    h.generate("Retail", "Loyalty").await;
    h.clock.advance(TimeDelta::seconds(3601));
    let (status, body) = h.generate("Retail", "Loyalty").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], false);
    assert_eq!(h.provider_calls(), 2);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let h = harness();

    let (status, body) = h
        .send(
            Method::POST,
            "/api/v1/ai/generate-strategy",
            Some(json!({ "industry": "A", "objective": "B" })),
            false,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = h.send(Method::GET, "/api/v1/ai/cache/stats", None, false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h.send(Method::DELETE, "/api/v1/ai/cache/clear", None, false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(h.provider_calls(), 0);
}

#[tokio::test]
async fn token_from_other_secret_is_rejected() {
    let h = harness();
    let forged = JwtKeys::new("wrong-secret", 60).issue("user-1", None, None);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/ai/cache/stats")
        .header(header::AUTHORIZATION, format!("Bearer {forged}"))
        .body(Body::empty())
        .expect("request should build");
    let response = h.router.clone().oneshot(request).await.expect("router should respond");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).map(|v| v.as_bytes()),
        Some(&b"Bearer"[..])
    );
}

#[tokio::test]
async fn clear_reports_purged_entries_and_keeps_counters() {
    let h = harness();
    h.generate("A", "1").await;
    h.generate("B", "2").await;
    h.generate("C", "3").await;
    h.generate("A", "1").await;

    let (status, body) = h.send(Method::DELETE, "/api/v1/ai/cache/clear", None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared_entries"], 3);
    assert_eq!(body["cleared_by"], "admin@example.com");

    let (_, stats) = h.send(Method::GET, "/api/v1/ai/cache/stats", None, true).await;
    assert_eq!(stats["total_entries"], 0);
    assert_eq!(stats["cache_hits"], 1);
    assert_eq!(stats["cache_misses"], 3);
    assert!(stats["oldest_entry"].is_null());
}

#[tokio::test]
async fn cache_health_is_public() {
    let h = harness();

    let (status, body) = h.send(Method::GET, "/api/v1/ai/cache/health", None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "empty");
    assert_eq!(body["cache_enabled"], true);

    // one miss, no hits yet
    h.generate("A", "B").await;
    let (_, body) = h.send(Method::GET, "/api/v1/ai/cache/health", None, false).await;
    assert_eq!(body["status"], "low_efficiency");
    assert_eq!(body["total_entries"], 1);

    h.generate("A", "B").await;
    let (_, body) = h.send(Method::GET, "/api/v1/ai/cache/health", None, false).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["hit_ratio"], 0.5);
    assert!(body["uptime_info"]["oldest_entry"].is_string());
}

#[tokio::test]
async fn blank_fields_are_rejected_before_the_cache() {
    let h = harness();

    let (status, body) = h.generate("   ", "Grow").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "invalid_input");

    let (_, stats) = h.send(Method::GET, "/api/v1/ai/cache/stats", None, true).await;
    assert_eq!(stats["cache_misses"], 0);
    assert_eq!(h.provider_calls(), 0);
}

#[tokio::test]
async fn incomplete_body_gets_json_error() {
    let h = harness();

    let (status, body) = h
        .send(
            Method::POST,
            "/api/v1/ai/generate-strategy",
            Some(json!({ "industry": "A" })),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "invalid_input");
    assert!(body["error"]["message"].is_string());
    assert_eq!(h.provider_calls(), 0);
}

#[tokio::test]
async fn malformed_or_untyped_body_gets_json_error() {
    let h = harness();

    for content_type in [Some("application/json"), None] {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/ai/generate-strategy")
            .header(header::AUTHORIZATION, format!("Bearer {}", h.token));
        if let Some(value) = content_type {
            builder = builder.header(header::CONTENT_TYPE, value);
        }
        let request = builder
            .body(Body::from("{not json"))
            .expect("request should build");

        let response = h.router.clone().oneshot(request).await.expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let body: Value = serde_json::from_slice(&bytes).expect("error body is JSON");

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "invalid_input");
    }

    let (_, stats) = h.send(Method::GET, "/api/v1/ai/cache/stats", None, true).await;
    assert_eq!(stats["cache_misses"], 0);
}

#[tokio::test]
async fn wildcard_origin_is_ignored() {
    let state = Arc::new(AppState {
        cache: StrategyCache::default(),
        provider: Arc::new(FakeProvider {
            calls: AtomicUsize::new(0),
            behaviour: Behaviour::Echo,
        }),
        rate_limiter: RateLimiter::new(1, Duration::from_secs(60)),
        jwt: JwtKeys::new(SECRET, 60),
    });
    let router = app::router(
        state,
        &["*".to_string(), "http://localhost:3000".to_string()],
    );

    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .expect("request should build");
    let response = router.oneshot(request).await.expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.as_bytes()),
        Some(&b"http://localhost:3000"[..])
    );
}

#[tokio::test]
async fn provider_quota_maps_to_429_and_nothing_is_cached() {
    let h = harness_with(Behaviour::Quota, 100);

    let (status, body) = h.generate("A", "B").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "ai_quota");

    let (_, stats) = h.send(Method::GET, "/api/v1/ai/cache/stats", None, true).await;
    assert_eq!(stats["total_entries"], 0);
}

#[tokio::test]
async fn missing_provider_key_maps_to_503() {
    let h = harness_with(Behaviour::Unconfigured, 100);

    let (status, body) = h.generate("A", "B").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "ai_unavailable");
}

#[tokio::test]
async fn rate_limit_only_applies_to_cache_misses() {
    let h = harness_with(Behaviour::Echo, 1);

    let (status, _) = h.generate("A", "B").await;
    assert_eq!(status, StatusCode::OK);

    // hits do not consume the quota
    for _ in 0..3 {
        let (status, body) = h.generate("A", "B").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cached"], true);
    }

    let (status, body) = h.generate("C", "D").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "rate_limited");
    assert_eq!(h.provider_calls(), 1);
}

#[tokio::test]
async fn health_and_metrics_endpoints() {
    let h = harness();

    let (status, body) = h.send(Method::GET, "/api/health", None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    h.generate("A", "B").await;

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .expect("request should build");
    let response = h.router.clone().oneshot(request).await.expect("router should respond");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("strategy_requests_total"));
    assert!(text.contains("strategy_cache_misses_total"));
}
