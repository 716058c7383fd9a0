//! Data model for the ordering engine

pub mod cart;
pub mod item;
pub mod order;

pub use cart::{Cart, CartLine, OrderMeta};
pub use item::{CatalogFileError, Item};
pub use order::{OrderRecord, OrderSummary};
