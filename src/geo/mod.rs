//! Geographic reference resolution
//!
//! Translates a territory code into the codes containing it (commune →
//! department and region, department → region) or contained by it
//! (region → departments).
//!
//! - **GeoApiClient**: HTTP client for geo.api.gouv.fr, with retry and cache
//! - **StaticGeoResolver**: fixed in-memory table, for development and tests

mod client;
mod fixed;

pub use client::{GeoApiClient, GeoApiConfig};
pub use fixed::StaticGeoResolver;

use serde::{Deserialize, Serialize};

/// Containing territories of a commune
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommuneContainment {
    pub department_code: String,
    pub region_code: String,
}

/// Containing region of a department
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentContainment {
    pub region_code: String,
}

/// Departments making up a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionComposition {
    pub department_codes: Vec<String>,
}

/// Read access to the administrative hierarchy
#[async_trait::async_trait]
pub trait GeoResolver: Send + Sync {
    async fn resolve_commune(&self, code: &str) -> Result<CommuneContainment, ResolutionError>;

    async fn resolve_department(&self, code: &str)
        -> Result<DepartmentContainment, ResolutionError>;

    async fn resolve_region(&self, code: &str) -> Result<RegionComposition, ResolutionError>;
}

/// Errors from geographic resolution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("Invalid territory code: {0}")]
    InvalidCode(String),

    #[error("Unknown territory: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Resolution timed out: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ResolutionError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

/// Check a territory code before it is put in a URL
///
/// Codes are short alphanumerics: "75056", "2A", "971", "11".
pub fn validate_code(code: &str) -> Result<(), ResolutionError> {
    let valid = !code.is_empty() && code.len() <= 5 && code.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(ResolutionError::InvalidCode(code.to_string()))
    }
}
