pub mod app;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod provider;
pub mod rate_limit;
pub mod state;
pub mod telemetry;
