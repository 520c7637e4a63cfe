use crate::services::analytics::parse_utc_offset;
use chrono::FixedOffset;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub store: StoreConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

/// Bounds for a single record-store round trip.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub request_timeout_secs: u64,
    pub retry_max_elapsed_secs: u64,
}

impl StoreConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_max_elapsed(&self) -> Duration {
        Duration::from_secs(self.retry_max_elapsed_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Reference timezone for bucket boundaries and displayed dates, as a
    /// `+HH:MM` UTC offset. The default matches the shop's deployment
    /// (Asia/Kolkata).
    pub utc_offset: String,
}

impl AnalyticsConfig {
    pub fn timezone(&self) -> Result<FixedOffset, AppError> {
        parse_utc_offset(&self.utc_offset).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "ANALYTICS_UTC_OFFSET must look like +05:30, got '{}'",
                self.utc_offset
            ))
        })
    }
}

impl BillingConfig {
    pub fn load() -> Result<Self, AppError> {
        // Common config handles .env and the APP__ prefix.
        let common = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let config = BillingConfig {
            common,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("billing_db"), is_prod)?,
            },
            store: StoreConfig {
                request_timeout_secs: parse_env_u64("STORE_REQUEST_TIMEOUT_SECS", 5)?,
                retry_max_elapsed_secs: parse_env_u64("STORE_RETRY_MAX_ELAPSED_SECS", 10)?,
            },
            analytics: AnalyticsConfig {
                utc_offset: get_env("ANALYTICS_UTC_OFFSET", Some("+05:30"), is_prod)?,
            },
        };

        // Fail startup on a bad offset rather than on first use.
        config.analytics.timezone()?;

        Ok(config)
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env_u64(key: &str, default: u64) -> Result<u64, AppError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|_| {
            AppError::ConfigError(anyhow::anyhow!("{} must be an integer, got '{}'", key, raw))
        }),
    }
}
