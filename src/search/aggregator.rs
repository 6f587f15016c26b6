//! Territory aggregator
//!
//! Runs two independent sweeps for a search and merges them:
//!
//! - the location branch walks the administrative hierarchy around the
//!   caller's initial perimeter (commune → department → region, or region →
//!   departments), one scoped store query per territory
//! - the universal branch asks, for each perimeter type, which aides apply
//!   to every territory of that type
//!
//! Store failures are fatal. Resolver failures only cut the location branch
//! short, and are reported in the response.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::filters::{RawFilters, SearchFilters};
use super::query::{AideQuery, SortOrder, Visibility};
use super::results::{assemble, BranchOutcome, SearchResponse, UnresolvedTerritory};
use crate::geo::{GeoResolver, ResolutionError};
use crate::model::{Aide, PerimeterType, WireValue, UNIVERSAL_SWEEP};
use crate::store::AideStore;
use crate::types::{AidesError, Result};

/// Aggregator limits and policy
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Bound on a single store query
    pub store_timeout: Duration,
    /// Bound on a single resolver call, retries included
    pub resolve_timeout: Duration,
    /// Which publication states searches may return
    pub visibility: Visibility,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(10),
            resolve_timeout: Duration::from_secs(20),
            visibility: Visibility::PublishedOnly,
        }
    }
}

/// Search engine over an aide store and a geographic resolver
#[derive(Clone)]
pub struct TerritoryAggregator {
    store: Arc<dyn AideStore>,
    geo: Arc<dyn GeoResolver>,
    config: AggregatorConfig,
}

impl TerritoryAggregator {
    pub fn new(
        store: Arc<dyn AideStore>,
        geo: Arc<dyn GeoResolver>,
        config: AggregatorConfig,
    ) -> Self {
        Self { store, geo, config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AideStore> {
        &self.store
    }

    /// Search from raw caller filters
    pub async fn search(&self, raw: RawFilters) -> Result<SearchResponse> {
        let filters = SearchFilters::normalize(raw);
        self.search_filters(&filters).await
    }

    /// Search from already normalized filters
    pub async fn search_filters(&self, filters: &SearchFilters) -> Result<SearchResponse> {
        let started = Instant::now();

        let (location, universal) =
            tokio::try_join!(self.location_branch(filters), self.universal_branch(filters))?;
        let response = assemble(location, universal);

        info!(
            initial_perimeter = ?filters.initial_perimeter.as_ref().map(|p| (p.perimeter_type.as_str(), p.code.as_str())),
            groups = response.groups.len(),
            subgroups = response.groups.iter().map(|g| g.subgroups.len()).sum::<usize>(),
            total = response.total_count,
            partial = response.partial,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search completed"
        );

        Ok(response)
    }

    /// Every aide, drafts included, most recently updated first
    pub async fn all_aides(&self) -> Result<Vec<Aide>> {
        let query = AideQuery::build(&SearchFilters::default(), Visibility::IncludeUnpublished);
        self.find(&query, Some(SortOrder::recently_updated())).await
    }

    /// One aide by identifier
    pub async fn get_aide(&self, id: &str) -> Result<Option<Aide>> {
        let lookup = self.store.find_by_id(id);
        match tokio::time::timeout(self.config.store_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(AidesError::Timeout(format!(
                "store lookup exceeded {}ms",
                self.config.store_timeout.as_millis()
            ))),
        }
    }

    async fn location_branch(&self, filters: &SearchFilters) -> Result<Option<BranchOutcome>> {
        let Some(ref initial) = filters.initial_perimeter else {
            return Ok(None);
        };

        // Location and free text are independent axes
        let base = AideQuery::build(&filters.without_keywords(), self.config.visibility);
        let code = initial.code.as_str();
        let mut outcome = BranchOutcome::default();

        match initial.perimeter_type {
            PerimeterType::Commune => self.commune_sweep(&base, code, &mut outcome).await?,
            PerimeterType::Departement => self.department_sweep(&base, code, &mut outcome).await?,
            PerimeterType::Region => self.region_sweep(&base, code, &mut outcome).await?,
            other => {
                debug!(perimeter_type = %other, "No hierarchy to walk for initial perimeter");
            }
        }

        Ok(Some(outcome))
    }

    async fn commune_sweep(
        &self,
        base: &AideQuery,
        code: &str,
        outcome: &mut BranchOutcome,
    ) -> Result<()> {
        let aides = self.find_scoped(base, PerimeterType::Commune, code).await?;
        outcome.push("votre_commune", "Pour votre commune", aides);

        let resolution = self.geo.resolve_commune(code);
        let Some(containment) = self
            .resolve(resolution, PerimeterType::Commune, code, outcome)
            .await
        else {
            return Ok(());
        };

        let (department, region) = tokio::try_join!(
            self.find_scoped(base, PerimeterType::Departement, &containment.department_code),
            self.find_scoped(base, PerimeterType::Region, &containment.region_code),
        )?;
        outcome.push("votre_departement", "Pour votre département", department);
        outcome.push("votre_region", "Pour votre région", region);
        Ok(())
    }

    async fn department_sweep(
        &self,
        base: &AideQuery,
        code: &str,
        outcome: &mut BranchOutcome,
    ) -> Result<()> {
        let aides = self.find_scoped(base, PerimeterType::Departement, code).await?;
        outcome.push("departement_de_recherche", "Pour votre département", aides);

        let resolution = self.geo.resolve_department(code);
        let Some(containment) = self
            .resolve(resolution, PerimeterType::Departement, code, outcome)
            .await
        else {
            return Ok(());
        };

        let region = self
            .find_scoped(base, PerimeterType::Region, &containment.region_code)
            .await?;
        outcome.push(
            "departement_de_recherche_region",
            "Pour la région de votre département",
            region,
        );
        Ok(())
    }

    async fn region_sweep(
        &self,
        base: &AideQuery,
        code: &str,
        outcome: &mut BranchOutcome,
    ) -> Result<()> {
        let aides = self.find_scoped(base, PerimeterType::Region, code).await?;
        outcome.push("region_de_recherche", "Pour votre région", aides);

        let resolution = self.geo.resolve_region(code);
        let Some(composition) = self
            .resolve(resolution, PerimeterType::Region, code, outcome)
            .await
        else {
            return Ok(());
        };

        // Wait for every department before looking at any result
        let lookups = composition
            .department_codes
            .iter()
            .map(|department| self.find_scoped(base, PerimeterType::Departement, department));
        let results = join_all(lookups).await;

        for (department, result) in composition.department_codes.iter().zip(results) {
            outcome.push(
                "departement_de_la_region",
                format!("Pour le département {department}"),
                result?,
            );
        }
        Ok(())
    }

    async fn universal_branch(&self, filters: &SearchFilters) -> Result<BranchOutcome> {
        let base = AideQuery::build(filters, self.config.visibility);
        let sweep: Vec<PerimeterType> = UNIVERSAL_SWEEP
            .iter()
            .copied()
            .filter(|t| filters.allows_perimeter_type(*t))
            .collect();

        let results = join_all(
            sweep
                .iter()
                .map(|perimeter_type| self.find_scoped(&base, *perimeter_type, "")),
        )
        .await;

        // Fixed type order, whatever the completion order
        let mut outcome = BranchOutcome::default();
        for (perimeter_type, result) in sweep.iter().zip(results) {
            outcome.push(perimeter_type.as_str(), perimeter_type.label(), result?);
        }
        Ok(outcome)
    }

    /// Await a resolver call, recording a failure as an unresolved territory
    async fn resolve<T, F>(
        &self,
        call: F,
        perimeter_type: PerimeterType,
        code: &str,
        outcome: &mut BranchOutcome,
    ) -> Option<T>
    where
        F: Future<Output = std::result::Result<T, ResolutionError>>,
    {
        let result = match tokio::time::timeout(self.config.resolve_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ResolutionError::Timeout(format!(
                "{} {} after {}ms",
                perimeter_type,
                code,
                self.config.resolve_timeout.as_millis()
            ))),
        };

        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    perimeter_type = %perimeter_type,
                    code = %code,
                    error = %err,
                    "Territory resolution failed, location results are partial"
                );
                outcome.mark_unresolved(UnresolvedTerritory::new(perimeter_type, code, &err));
                None
            }
        }
    }

    async fn find_scoped(
        &self,
        base: &AideQuery,
        perimeter_type: PerimeterType,
        code: &str,
    ) -> Result<Vec<Aide>> {
        let query = base.clone().scoped_to(perimeter_type, code);
        let aides = self.find(&query, None).await?;
        debug!(
            perimeter_type = %perimeter_type,
            code = %code,
            count = aides.len(),
            "Scoped query"
        );
        Ok(aides)
    }

    async fn find(&self, query: &AideQuery, sort: Option<SortOrder>) -> Result<Vec<Aide>> {
        let result = match tokio::time::timeout(self.config.store_timeout, self.store.find(query, sort)).await {
            Ok(result) => result,
            Err(_) => Err(AidesError::Timeout(format!(
                "store query exceeded {}ms",
                self.config.store_timeout.as_millis()
            ))),
        };

        result.map_err(|err| {
            error!(store = self.store.kind(), error = %err, "Store query failed");
            err
        })
    }
}
