//! Shared types for the Shopdesk ordering engine
//!
//! Data model used across crates: catalog items, cart lines, order
//! records, and the time/mobile helpers the engine relies on.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    Cart, CartLine, CatalogFileError, Item, OrderMeta, OrderRecord, OrderSummary,
};
