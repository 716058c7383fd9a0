//! In-memory catalog index

use super::loader::CatalogLoader;
use crate::orders::error::OrderResult;
use crate::storage::Store;
use parking_lot::RwLock;
use shared::models::Item;
use std::sync::Arc;

/// Flattened catalog with cheap snapshot access
///
/// Items live behind an `Arc` that is swapped atomically on rebuild, so
/// the search pipeline clones a handle instead of the whole catalog.
pub struct ItemIndex {
    store: Store,
    items: RwLock<Arc<Vec<Item>>>,
}

impl ItemIndex {
    /// Restore the index from the persisted catalog (empty if none)
    pub fn new(store: Store) -> OrderResult<Self> {
        let items = store.load_items()?;
        Ok(Self {
            store,
            items: RwLock::new(Arc::new(items)),
        })
    }

    /// Reload the catalog through the loader boundary
    ///
    /// Persists the flattened items and any per-source discount defaults,
    /// swaps the in-memory snapshot, and surfaces per-file failures as
    /// warnings. Returns the number of failed files.
    pub fn reload(&self, loader: &dyn CatalogLoader, force_refresh: bool) -> OrderResult<usize> {
        let load = loader.load(force_refresh);

        for err in &load.errors {
            tracing::warn!(file = %err.file, error = %err.error, "Catalog file failed to load");
        }
        if !load.errors.is_empty() {
            tracing::warn!(failed = load.errors.len(), "{} files failed to load", load.errors.len());
        }

        self.store.replace_items(&load.items)?;
        for (source, percent) in &load.source_discounts {
            self.store.set_source_discount(source, *percent)?;
        }

        tracing::info!(
            items = load.items.len(),
            sources = self.count_sources(&load.items),
            "Catalog reloaded"
        );
        *self.items.write() = Arc::new(load.items);
        Ok(load.errors.len())
    }

    /// Snapshot handle to the current catalog, in catalog order
    pub fn snapshot(&self) -> Arc<Vec<Item>> {
        self.items.read().clone()
    }

    /// Distinct sources in first-seen order
    pub fn sources(&self) -> Vec<String> {
        let items = self.snapshot();
        let mut sources: Vec<String> = Vec::new();
        for item in items.iter() {
            if !sources.iter().any(|s| s == &item.source) {
                sources.push(item.source.clone());
            }
        }
        sources
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn count_sources(&self, items: &[Item]) -> usize {
        let mut seen: Vec<&str> = Vec::new();
        for item in items {
            if !seen.contains(&item.source.as_str()) {
                seen.push(&item.source);
            }
        }
        seen.len()
    }
}

impl std::fmt::Debug for ItemIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemIndex").field("items", &self.len()).finish()
    }
}
