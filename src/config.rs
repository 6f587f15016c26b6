//! Configuration for aides-territoires
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;

use crate::geo::GeoApiConfig;
use crate::search::{AggregatorConfig, Visibility};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// aides-territoires - territory-scoped aide search service
#[derive(Parser, Debug, Clone)]
#[command(name = "aides-territoires")]
#[command(about = "Search grants and subsidies around a French territory")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8100")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "aides-territoires")]
    pub mongodb_db: String,

    /// Collection holding aide records
    #[arg(long, env = "AIDES_COLLECTION", default_value = "aides")]
    pub aides_collection: String,

    /// Base URL of the geographic reference API
    #[arg(long, env = "GEO_API_URL", default_value = "https://geo.api.gouv.fr")]
    pub geo_api_url: String,

    /// Timeout for one geographic API call in milliseconds
    #[arg(long, env = "RESOLVER_TIMEOUT_MS", default_value = "5000")]
    pub resolver_timeout_ms: u64,

    /// Retries after a transient geographic API failure
    #[arg(long, env = "RESOLVER_RETRIES", default_value = "2")]
    pub resolver_retries: u32,

    /// How long resolved territory codes stay cached (0 disables the cache)
    #[arg(long, env = "RESOLVER_CACHE_TTL_SECS", default_value = "3600")]
    pub resolver_cache_ttl_secs: u64,

    /// Timeout for one store query in milliseconds
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value = "10000")]
    pub store_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Enable development mode (empty in-memory store when MongoDB is down)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,
}

impl Args {
    /// Geographic API client settings
    pub fn geo_config(&self) -> GeoApiConfig {
        GeoApiConfig {
            base_url: self.geo_api_url.clone(),
            request_timeout: Duration::from_millis(self.resolver_timeout_ms),
            max_retries: self.resolver_retries,
            cache_ttl: Duration::from_secs(self.resolver_cache_ttl_secs),
            ..GeoApiConfig::default()
        }
    }

    /// Aggregator settings
    ///
    /// The resolver bound covers every attempt plus the worst backoff.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        let attempts = u64::from(self.resolver_retries) + 1;
        // One worst-case client backoff per retry, jitter included
        let backoff_ms: u64 = (0..self.resolver_retries)
            .map(|n| 150u64 << n.min(6))
            .fold(0, u64::saturating_add);

        AggregatorConfig {
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            resolve_timeout: Duration::from_millis(
                self.resolver_timeout_ms.saturating_mul(attempts) + backoff_ms,
            ),
            visibility: Visibility::PublishedOnly,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.resolver_timeout_ms == 0 {
            return Err("RESOLVER_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.store_timeout_ms == 0 {
            return Err("STORE_TIMEOUT_MS must be greater than zero".to_string());
        }

        if !(self.geo_api_url.starts_with("http://") || self.geo_api_url.starts_with("https://")) {
            return Err(format!(
                "GEO_API_URL must be an http(s) URL, got '{}'",
                self.geo_api_url
            ));
        }

        if self.aides_collection.trim().is_empty() {
            return Err("AIDES_COLLECTION must not be empty".to_string());
        }

        Ok(())
    }
}
