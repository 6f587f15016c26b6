//! Territory-scoped aide search
//!
//! - **filters**: raw caller input → [`SearchFilters`]
//! - **query**: [`SearchFilters`] → store-agnostic [`AideQuery`]
//! - **aggregator**: location and universal sweeps over the store
//! - **results**: grouped [`SearchResponse`] assembly

pub mod aggregator;
pub mod filters;
pub mod query;
pub mod results;

pub use aggregator::{AggregatorConfig, TerritoryAggregator};
pub use filters::{
    clean_raw_filters, FilterSet, InitialPerimeter, RawFilters, SearchFilters, ValidationError,
    GEOCODING_PAYLOAD_KEY,
};
pub use query::{AideField, AideQuery, Condition, SortOrder, Visibility};
pub use results::{
    assemble, total_count, BranchOutcome, GroupKind, ResultGroup, SearchResponse,
    TerritorySubgroup, UnresolvedTerritory,
};
