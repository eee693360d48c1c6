use clap::Parser; // for cli
use std::sync::Arc;
use tracing::{info, warn};

use strategy_gateway::app;
use strategy_gateway::auth::JwtKeys;
use strategy_gateway::cache::StrategyCache;
use strategy_gateway::config::{Args, Command};
use strategy_gateway::provider::GeminiProvider;
use strategy_gateway::rate_limit::RateLimiter;
use strategy_gateway::state::AppState;
use strategy_gateway::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // parse cli arguments
    let args = Args::parse();
    let jwt = JwtKeys::new(&args.jwt_secret, args.jwt_expiration_minutes);

    if let Some(Command::IssueToken {
        subject,
        email,
        role,
    }) = &args.command
    {
        println!("{}", jwt.issue(subject, email.clone(), role.clone()));
        return Ok(());
    }

    telemetry::init()?;

    let provider = GeminiProvider::new(
        reqwest::Client::new(),
        &args.gemini_base_url,
        &args.gemini_model,
        args.gemini_api_key.clone(),
        args.provider_timeout(),
    );
    if !provider.is_configured() {
        warn!("GEMINI_API_KEY not set - strategy generation will answer 503 on cache misses");
    }

    // creating shared state
    let state = Arc::new(AppState {
        cache: StrategyCache::new(args.cache_ttl()),
        provider: Arc::new(provider),
        rate_limiter: RateLimiter::new(args.rate_limit, args.rate_window()),
        jwt,
    });

    let origins = args.origins();
    let router = app::router(Arc::clone(&state), &origins);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "strategy gateway listening");
    info!(model = %args.gemini_model, "forwarding cache misses to Gemini");
    info!(ttl_secs = state.cache.ttl().num_seconds(), "strategy cache ready");
    info!(
        limit = args.rate_limit,
        window_secs = args.rate_window,
        "generation rate limit"
    );
    info!(origins = ?origins, "CORS origins");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("strategy gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
