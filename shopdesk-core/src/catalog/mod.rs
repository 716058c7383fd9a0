//! Catalog: flattened item index and the loader boundary
//!
//! Catalog ingestion is a collaborator, not part of the engine: a
//! [`CatalogLoader`] hands over a flat item list, per-source discount
//! defaults, and a list of per-file errors. The [`ItemIndex`] holds the
//! flattened catalog in memory, persists it through the store, and is
//! rebuilt wholesale on every (re)load.

pub mod index;
pub mod loader;

pub use index::ItemIndex;
pub use loader::{CatalogLoad, CatalogLoader, DirLoader};
