use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStatistics;
use crate::error::ApiError;

const MAX_FIELD_CHARS: usize = 100;

// Strategy request from the sales page
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct StrategyRequest {
    pub industry: String,
    pub objective: String,
}

impl StrategyRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_field("industry", &self.industry)?;
        check_field("objective", &self.objective)
    }
}

fn check_field(name: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{name} must not be empty")));
    }
    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(ApiError::InvalidInput(format!(
            "{name} must be at most {MAX_FIELD_CHARS} characters"
        )));
    }
    Ok(())
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct StrategyResponse {
    pub strategy: String,
    pub cached: bool,
    pub cache_timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ClearResponse {
    pub message: String,
    pub cleared_entries: usize,
    pub cleared_by: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CacheHealth {
    Healthy,
    Empty,
    LowEfficiency,
    HighUsage,
}

impl CacheHealth {
    pub const LOW_EFFICIENCY_RATIO: f64 = 0.30;
    pub const HIGH_USAGE_ENTRIES: usize = 1000;

    // first matching rule wins
    pub fn classify(stats: &CacheStatistics) -> Self {
        if stats.total_entries == 0 {
            CacheHealth::Empty
        } else if stats.hit_ratio < Self::LOW_EFFICIENCY_RATIO {
            CacheHealth::LowEfficiency
        } else if stats.total_entries > Self::HIGH_USAGE_ENTRIES {
            CacheHealth::HighUsage
        } else {
            CacheHealth::Healthy
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct UptimeInfo {
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CacheHealthResponse {
    pub status: CacheHealth,
    pub cache_enabled: bool,
    pub total_entries: usize,
    pub hit_ratio: f64,
    pub uptime_info: UptimeInfo,
}

impl From<CacheStatistics> for CacheHealthResponse {
    fn from(stats: CacheStatistics) -> Self {
        Self {
            status: CacheHealth::classify(&stats),
            cache_enabled: true,
            total_entries: stats.total_entries,
            hit_ratio: stats.hit_ratio,
            uptime_info: UptimeInfo {
                oldest_entry: stats.oldest_entry,
                newest_entry: stats.newest_entry,
            },
        }
    }
}
