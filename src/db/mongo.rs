//! MongoDB client and collection wrapper

use bson::{doc, Document};
use mongodb::{error::ErrorKind, options::IndexOptions, Client, Collection, IndexModel};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, warn};

use crate::types::AidesError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping the database
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, AidesError> {
        info!("Connecting to MongoDB at {}", uri);

        // Fail fast when the server is down instead of the 30s driver default
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| AidesError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AidesError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection, creating its indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, AidesError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed read-only collection
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
{
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, AidesError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), AidesError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| AidesError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, AidesError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| AidesError::Database(format!("Find failed: {}", e)))
    }

    /// Find every document matching a filter, optionally sorted
    ///
    /// Documents that fail to decode are logged and skipped. Any other
    /// cursor error aborts the read.
    pub async fn find_many(
        &self,
        filter: Document,
        sort: Option<Document>,
    ) -> Result<Vec<T>, AidesError> {
        use futures_util::TryStreamExt;

        debug!(filter = %filter, "MongoDB find");

        let mut find = self.inner.find(filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }

        let mut cursor = find
            .await
            .map_err(|e| AidesError::Database(format!("Find failed: {}", e)))?;

        let mut results = Vec::new();
        loop {
            match cursor.try_next().await {
                Ok(Some(d)) => results.push(d),
                Ok(None) => break,
                Err(e) if is_undecodable(&e.kind) => {
                    warn!("Skipping undecodable document: {}", e);
                }
                Err(e) => {
                    error!("Cursor failed after {} documents: {}", results.len(), e);
                    return Err(AidesError::Database(format!("Cursor read failed: {}", e)));
                }
            }
        }

        Ok(results)
    }
}

/// Whether a cursor error concerns one document rather than the read
fn is_undecodable(kind: &ErrorKind) -> bool {
    matches!(kind, ErrorKind::BsonDeserialization(_))
}
