//! aides-territoires - territory-scoped aide search
//!
//! Finds the grants and subsidies available around a French territory. A
//! search walks the administrative hierarchy from the caller's initial
//! perimeter and sweeps the aides applying to every territory of a kind,
//! then returns both as labelled, counted groups.
//!
//! ## Components
//!
//! - **Search**: filter normalization, query building, the territory
//!   aggregator and result assembly
//! - **Geo**: containment lookups against geo.api.gouv.fr
//! - **Store**: aide records in MongoDB or in memory
//! - **Server**: JSON over hyper http1

pub mod config;
pub mod db;
pub mod geo;
pub mod logging;
pub mod model;
pub mod routes;
pub mod search;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use search::{SearchFilters, SearchResponse, TerritoryAggregator};
pub use server::{run, AppState};
pub use types::{AidesError, Result};
