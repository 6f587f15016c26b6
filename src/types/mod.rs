//! Shared types for aides-territoires

mod error;

pub use error::{AidesError, Result};
