//! geo.api.gouv.fr client
//!
//! Containment lookups are cached: the administrative map changes a few
//! times a year at most.

use dashmap::DashMap;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{
    validate_code, CommuneContainment, DepartmentContainment, GeoResolver, RegionComposition,
    ResolutionError,
};

/// Configuration for the geo API client
#[derive(Debug, Clone)]
pub struct GeoApiConfig {
    /// Base URL of the reference service
    pub base_url: String,
    /// Timeout for one HTTP attempt (default: 5 seconds)
    pub request_timeout: Duration,
    /// Extra attempts after a transient failure (default: 2)
    pub max_retries: u32,
    /// Cache TTL for resolved codes, zero disables caching (default: 1 hour)
    pub cache_ttl: Duration,
    /// Maximum cache entries (default: 10000)
    pub max_cache_entries: usize,
}

impl Default for GeoApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://geo.api.gouv.fr".to_string(),
            request_timeout: Duration::from_secs(5),
            max_retries: 2,
            cache_ttl: Duration::from_secs(3600),
            max_cache_entries: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
enum Containment {
    Commune(CommuneContainment),
    Department(DepartmentContainment),
    Region(RegionComposition),
}

struct CachedContainment {
    value: Containment,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommuneRecord {
    code_departement: Option<String>,
    code_region: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DepartementRecord {
    code: String,
    code_region: Option<String>,
}

/// HTTP resolver backed by the national geographic API
pub struct GeoApiClient {
    config: GeoApiConfig,
    http_client: reqwest::Client,
    cache: DashMap<String, CachedContainment>,
}

impl GeoApiClient {
    /// Create a client with default configuration
    pub fn new() -> Self {
        Self::with_config(GeoApiConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: GeoApiConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("aides-territoires/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
            cache: DashMap::new(),
        }
    }

    pub fn config(&self) -> &GeoApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// GET a JSON document, retrying transient failures with backoff
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ResolutionError> {
        let url = self.url(path);
        let mut attempt = 0;

        loop {
            let result = match tokio::time::timeout(self.config.request_timeout, self.fetch(&url)).await {
                Ok(result) => result,
                Err(_) => Err(ResolutionError::Timeout(url.clone())),
            };

            match result {
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    let delay = backoff(attempt);
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Geo API call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, ResolutionError> {
        debug!(url = %url, "Geo API request");

        let response = self
            .http_client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolutionError::Timeout(e.to_string())
                } else {
                    ResolutionError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolutionError::NotFound(url.to_string()));
        }
        if status.is_server_error() {
            return Err(ResolutionError::Network(format!("HTTP {} from {}", status, url)));
        }
        if !status.is_success() {
            return Err(ResolutionError::InvalidResponse(format!(
                "HTTP {} from {}",
                status, url
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ResolutionError::InvalidResponse(e.to_string()))
    }

    fn cached(&self, key: &str) -> Option<Containment> {
        self.cache.get(key).and_then(|entry| {
            if entry.expires_at > Instant::now() {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    fn remember(&self, key: String, value: Containment) {
        if self.config.cache_ttl.is_zero() {
            return;
        }

        if self.cache.len() >= self.config.max_cache_entries {
            let now = Instant::now();
            self.cache.retain(|_, v| v.expires_at > now);

            if self.cache.len() >= self.config.max_cache_entries {
                let to_remove: Vec<String> = self
                    .cache
                    .iter()
                    .take(self.cache.len() / 2)
                    .map(|entry| entry.key().clone())
                    .collect();
                for key in to_remove {
                    self.cache.remove(&key);
                }
            }
        }

        self.cache.insert(
            key,
            CachedContainment {
                value,
                expires_at: Instant::now() + self.config.cache_ttl,
            },
        );
    }

    /// Number of cached resolutions
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for GeoApiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// 100ms, 200ms, 400ms... plus up to 50ms of jitter
fn backoff(attempt: u32) -> Duration {
    let base = 100u64.saturating_mul(1u64 << attempt.min(6));
    let jitter = rand::thread_rng().gen_range(0..50);
    Duration::from_millis(base + jitter)
}

fn missing(what: &str, code: &str) -> ResolutionError {
    ResolutionError::InvalidResponse(format!("no {} for {}", what, code))
}

#[async_trait::async_trait]
impl GeoResolver for GeoApiClient {
    async fn resolve_commune(&self, code: &str) -> Result<CommuneContainment, ResolutionError> {
        validate_code(code)?;
        let key = format!("commune:{code}");
        if let Some(Containment::Commune(found)) = self.cached(&key) {
            debug!(code = %code, "Commune resolved from cache");
            return Ok(found);
        }

        let record: CommuneRecord = self.get_json(&format!("communes/{code}")).await?;
        let containment = CommuneContainment {
            department_code: record.code_departement.ok_or_else(|| missing("department", code))?,
            region_code: record.code_region.ok_or_else(|| missing("region", code))?,
        };

        self.remember(key, Containment::Commune(containment.clone()));
        Ok(containment)
    }

    async fn resolve_department(
        &self,
        code: &str,
    ) -> Result<DepartmentContainment, ResolutionError> {
        validate_code(code)?;
        let key = format!("departement:{code}");
        if let Some(Containment::Department(found)) = self.cached(&key) {
            debug!(code = %code, "Department resolved from cache");
            return Ok(found);
        }

        let record: DepartementRecord = self.get_json(&format!("departements/{code}")).await?;
        let containment = DepartmentContainment {
            region_code: record.code_region.ok_or_else(|| missing("region", code))?,
        };

        self.remember(key, Containment::Department(containment.clone()));
        Ok(containment)
    }

    async fn resolve_region(&self, code: &str) -> Result<RegionComposition, ResolutionError> {
        validate_code(code)?;
        let key = format!("region:{code}");
        if let Some(Containment::Region(found)) = self.cached(&key) {
            debug!(code = %code, "Region resolved from cache");
            return Ok(found);
        }

        let records: Vec<DepartementRecord> =
            self.get_json(&format!("regions/{code}/departements")).await?;
        let composition = RegionComposition {
            department_codes: records.into_iter().map(|r| r.code).collect(),
        };

        self.remember(key, Containment::Region(composition.clone()));
        Ok(composition)
    }
}
