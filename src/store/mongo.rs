//! MongoDB-backed aide store

use bson::{doc, oid::ObjectId};
use tracing::debug;

use super::AideStore;
use crate::db::{AideDoc, MongoClient, MongoCollection};
use crate::model::Aide;
use crate::search::{AideQuery, SortOrder};
use crate::types::Result;

pub struct MongoAideStore {
    collection: MongoCollection<AideDoc>,
}

impl MongoAideStore {
    /// Open the aide collection, creating its indexes
    pub async fn new(client: &MongoClient, collection_name: &str) -> Result<Self> {
        let collection = client.collection::<AideDoc>(collection_name).await?;
        Ok(Self { collection })
    }
}

#[async_trait::async_trait]
impl AideStore for MongoAideStore {
    async fn find(&self, query: &AideQuery, sort: Option<SortOrder>) -> Result<Vec<Aide>> {
        let filter = query.to_document();
        let docs = self
            .collection
            .find_many(filter, sort.map(|s| s.to_document()))
            .await?;

        debug!(count = docs.len(), "Aides loaded from MongoDB");
        Ok(docs.into_iter().map(Aide::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Aide>> {
        let oid = ObjectId::parse_str(id)?;
        let found = self.collection.find_one(doc! { "_id": oid }).await?;
        Ok(found.map(Aide::from))
    }

    fn kind(&self) -> &'static str {
        "mongodb"
    }
}
