//! In-memory aide store

use std::sync::Arc;
use tokio::sync::RwLock;

use super::AideStore;
use crate::model::Aide;
use crate::search::{AideQuery, SortOrder};
use crate::types::Result;

/// Store evaluating queries over a vector held in memory
#[derive(Clone, Default)]
pub struct InMemoryAideStore {
    aides: Arc<RwLock<Vec<Aide>>>,
}

impl InMemoryAideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aides(aides: Vec<Aide>) -> Self {
        Self {
            aides: Arc::new(RwLock::new(aides)),
        }
    }

    pub async fn insert(&self, aide: Aide) {
        self.aides.write().await.push(aide);
    }

    pub async fn len(&self) -> usize {
        self.aides.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.aides.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl AideStore for InMemoryAideStore {
    async fn find(&self, query: &AideQuery, sort: Option<SortOrder>) -> Result<Vec<Aide>> {
        let mut found: Vec<Aide> = self
            .aides
            .read()
            .await
            .iter()
            .filter(|aide| query.matches(aide))
            .cloned()
            .collect();

        if let Some(order) = sort {
            // Stable, so insertion order breaks ties
            found.sort_by(|a, b| order.compare(a, b));
        }
        Ok(found)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Aide>> {
        Ok(self.aides.read().await.iter().find(|aide| aide.id == id).cloned())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PerimeterType, PublicationStatus};
    use crate::search::{SearchFilters, Visibility};
    use chrono::{TimeZone, Utc};

    fn store() -> InMemoryAideStore {
        InMemoryAideStore::with_aides(vec![
            Aide::new("old", "Ancienne", PerimeterType::France, "")
                .with_updated_at(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            Aide::new("draft", "Brouillon", PerimeterType::France, "")
                .with_status(PublicationStatus::Draft),
            Aide::new("new", "Récente", PerimeterType::Commune, "75056")
                .with_updated_at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
        ])
    }

    #[tokio::test]
    async fn test_find_filters_and_sorts() {
        let store = store();
        let query = AideQuery::build(&SearchFilters::default(), Visibility::PublishedOnly);

        let found = store.find(&query, Some(SortOrder::recently_updated())).await.unwrap();
        let ids: Vec<_> = found.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_scoped_query_and_lookup() {
        let store = store();
        let query = AideQuery::all().scoped_to(PerimeterType::France, "");

        let found = store.find(&query, None).await.unwrap();
        assert_eq!(found.len(), 2);

        assert!(store.find_by_id("new").await.unwrap().is_some());
        assert!(store.find_by_id("missing").await.unwrap().is_none());
        assert_eq!(store.kind(), "memory");
    }
}
