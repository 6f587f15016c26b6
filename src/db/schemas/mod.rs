//! Database schemas
//!
//! MongoDB document structures, converted to the served model on read.

mod aide;

pub use aide::{AideDoc, AIDE_COLLECTION};
