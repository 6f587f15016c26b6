//! Database layer
//!
//! MongoDB storage for aide records.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection};
pub use schemas::{AideDoc, AIDE_COLLECTION};
