use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use std::time::Duration;

// About ten years; keeps token expiry inside chrono's range
pub const MAX_JWT_EXPIRATION_MINUTES: i64 = 5_256_000;

const DEFAULT_CORS_ORIGINS: &str = concat!(
    "https://vertex-target.vercel.app,",
    "http://localhost:3000,",
    "http://localhost:5173"
);

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "strategy-gateway")]
#[command(about = "Cached AI strategy generation backend")]
pub struct Args {
    // Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    // Strategy cache TTL in seconds
    #[arg(short, long, env = "CACHE_TTL_SECS", default_value_t = 86_400)]
    pub cache_ttl: u64,

    // Max provider calls per user per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_WINDOW_SECS", default_value_t = 60)]
    pub rate_window: u64,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-pro-latest")]
    pub gemini_model: String,

    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub gemini_base_url: String,

    // Timeout for one provider call, in seconds
    #[arg(long, env = "PROVIDER_TIMEOUT_SECS", default_value_t = 60)]
    pub provider_timeout: u64,

    #[arg(
        long,
        env = "JWT_SECRET",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub jwt_secret: String,

    #[arg(
        long,
        env = "JWT_EXPIRATION_MINUTES",
        default_value_t = 1440,
        value_parser = clap::value_parser!(i64).range(1..=MAX_JWT_EXPIRATION_MINUTES)
    )]
    pub jwt_expiration_minutes: i64,

    // Allowed CORS origins (comma-separated)
    #[arg(
        long,
        env = "CORS_ORIGINS",
        default_value = DEFAULT_CORS_ORIGINS
    )]
    pub cors_origins: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a bearer token signed with the configured secret
    IssueToken {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
}

impl Args {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout)
    }

    pub fn origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim()) // remove spaces
            .filter(|s| !s.is_empty()) // remove empty strings
            .map(|s| s.to_string())
            .collect()
    }
}
