//! Aide record stores
//!
//! The search engine only needs filtered reads. Two backends:
//!
//! - **MongoAideStore**: the production document store
//! - **InMemoryAideStore**: a vector of aides, for development and tests

mod memory;
mod mongo;

pub use memory::InMemoryAideStore;
pub use mongo::MongoAideStore;

use crate::model::Aide;
use crate::search::{AideQuery, SortOrder};
use crate::types::Result;

/// Filtered read access to aide records
#[async_trait::async_trait]
pub trait AideStore: Send + Sync {
    /// Every aide matching the query, in store order unless a sort is given
    async fn find(&self, query: &AideQuery, sort: Option<SortOrder>) -> Result<Vec<Aide>>;

    /// One aide by identifier
    async fn find_by_id(&self, id: &str) -> Result<Option<Aide>>;

    /// Backend name for logs and health output
    fn kind(&self) -> &'static str;
}
