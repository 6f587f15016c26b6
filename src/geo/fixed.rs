//! Fixed-table resolver

use std::collections::HashMap;

use super::{
    validate_code, CommuneContainment, DepartmentContainment, GeoResolver, RegionComposition,
    ResolutionError,
};

/// Resolver answering from in-memory tables
///
/// Used when the reference service is not reachable in development, and as
/// the resolver of choice in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticGeoResolver {
    communes: HashMap<String, CommuneContainment>,
    departments: HashMap<String, DepartmentContainment>,
    regions: HashMap<String, RegionComposition>,
    unreachable: bool,
}

impl StaticGeoResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver whose every call fails with a network error
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with_commune(mut self, code: &str, department_code: &str, region_code: &str) -> Self {
        self.communes.insert(
            code.to_string(),
            CommuneContainment {
                department_code: department_code.to_string(),
                region_code: region_code.to_string(),
            },
        );
        self
    }

    pub fn with_department(mut self, code: &str, region_code: &str) -> Self {
        self.departments.insert(
            code.to_string(),
            DepartmentContainment {
                region_code: region_code.to_string(),
            },
        );
        self
    }

    /// Register a region and its departments, in listing order
    pub fn with_region<I, S>(mut self, code: &str, department_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions.insert(
            code.to_string(),
            RegionComposition {
                department_codes: department_codes.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    fn check(&self, code: &str) -> Result<(), ResolutionError> {
        validate_code(code)?;
        if self.unreachable {
            return Err(ResolutionError::Network("reference service unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl GeoResolver for StaticGeoResolver {
    async fn resolve_commune(&self, code: &str) -> Result<CommuneContainment, ResolutionError> {
        self.check(code)?;
        self.communes
            .get(code)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound(format!("commune {code}")))
    }

    async fn resolve_department(
        &self,
        code: &str,
    ) -> Result<DepartmentContainment, ResolutionError> {
        self.check(code)?;
        self.departments
            .get(code)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound(format!("departement {code}")))
    }

    async fn resolve_region(&self, code: &str) -> Result<RegionComposition, ResolutionError> {
        self.check(code)?;
        self.regions
            .get(code)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound(format!("region {code}")))
    }
}
