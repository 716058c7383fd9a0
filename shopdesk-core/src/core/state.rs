//! Session facade
//!
//! One [`Session`] wires the engine together for a clerk's working day:
//! catalog index, discount resolution, working cart, persisted orders,
//! and the current search view (query, source filter, paging cursor).
//! Callers talk to the session; components never reach around it.

use crate::cart::CartStore;
use crate::catalog::{CatalogLoader, ItemIndex};
use crate::core::config::Config;
use crate::messaging::{self, MessageSink};
use crate::orders::{OrderError, OrderResult, OrderStore, SaveOutcome};
use crate::pricing::{BrowseMode, DiscountEngine};
use crate::search::debounce::DEFAULT_DEBOUNCE_MS;
use crate::search::{Pager, SearchDebouncer, SearchEngine, SearchOutcome, SourceFilter};
use crate::storage::Store;
use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use shared::models::{Item, OrderRecord, OrderSummary};
use shared::util::{is_valid_mobile, normalize_mobile};
use std::sync::Arc;
use std::time::Duration;

/// Current search view state
#[derive(Debug, Clone, Default)]
struct ViewState {
    query: String,
    filter: SourceFilter,
}

/// The engine facade: one working session over one store
pub struct Session {
    catalog: ItemIndex,
    discounts: DiscountEngine,
    cart: CartStore,
    orders: OrderStore,
    engine: SearchEngine,
    view: RwLock<ViewState>,
    pager: RwLock<Pager>,
    debounce: Duration,
}

impl Session {
    /// Open the session against the configured database
    pub fn initialize(config: &Config) -> OrderResult<Self> {
        std::fs::create_dir_all(&config.work_dir).map_err(|e| {
            OrderError::Storage(crate::storage::StorageError::Storage(
                redb::StorageError::Io(e),
            ))
        })?;
        let store = Store::open(config.db_path())?;
        Self::with_store(
            store,
            config.page_size,
            Duration::from_millis(config.debounce_ms),
        )
    }

    /// Session over an in-memory store (for testing)
    pub fn in_memory() -> OrderResult<Self> {
        Self::with_store(
            Store::open_in_memory()?,
            20,
            Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        )
    }

    fn with_store(store: Store, page_size: usize, debounce: Duration) -> OrderResult<Self> {
        let catalog = ItemIndex::new(store.clone())?;
        let discounts = DiscountEngine::new(store.clone())?;
        let cart = CartStore::new(store.clone())?;
        let orders = OrderStore::new(store);
        tracing::info!(items = catalog.len(), cart_lines = cart.line_count(), "Session ready");
        Ok(Self {
            catalog,
            discounts,
            cart,
            orders,
            engine: SearchEngine,
            view: RwLock::new(ViewState::default()),
            pager: RwLock::new(Pager::new(page_size)),
            debounce,
        })
    }

    pub fn catalog(&self) -> &ItemIndex {
        &self.catalog
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn orders(&self) -> &OrderStore {
        &self.orders
    }

    pub fn discounts(&self) -> &DiscountEngine {
        &self.discounts
    }

    /// Reload the catalog and refresh the discount defaults shipped
    /// with it. Returns the number of files that failed to load.
    pub fn load_catalog(
        &self,
        loader: &dyn CatalogLoader,
        force_refresh: bool,
    ) -> OrderResult<usize> {
        let failed = self.catalog.reload(loader, force_refresh)?;
        self.discounts.reload_source_defaults()?;
        Ok(failed)
    }

    // === Search view ===

    /// Run a query against the current filter; resets paging
    pub fn search(&self, query: &str) -> SearchOutcome {
        let filter = {
            let mut view = self.view.write();
            view.query = query.to_string();
            view.filter.clone()
        };
        self.pager.write().reset();
        self.engine.search(&self.catalog, query, &filter)
    }

    /// Switch the source filter and re-run the current query
    pub fn set_filter(&self, filter: SourceFilter) -> SearchOutcome {
        let query = {
            let mut view = self.view.write();
            view.filter = filter.clone();
            view.query.clone()
        };
        self.pager.write().reset();
        self.engine.search(&self.catalog, &query, &filter)
    }

    /// Extend the visible window by one page
    pub fn load_more(&self) {
        self.pager.write().load_more();
    }

    /// The currently visible slice of a result list
    pub fn visible<'a>(&self, results: &'a [Item]) -> &'a [Item] {
        self.pager.read().page(results)
    }

    pub fn has_more(&self, results: &[Item]) -> bool {
        self.pager.read().has_more(results)
    }

    /// Build a debouncer that runs settled queries through this session
    /// and hands each outcome to the callback. The settle window comes
    /// from `DEBOUNCE_MS`.
    pub fn search_debouncer(
        self: &Arc<Self>,
        on_outcome: impl Fn(SearchOutcome) + Send + Sync + 'static,
    ) -> SearchDebouncer {
        let session = Arc::clone(self);
        SearchDebouncer::new(self.debounce, move |query| {
            on_outcome(session.search(&query));
        })
    }

    /// Global discount fallback implied by the current filter
    pub fn browse_mode(&self) -> BrowseMode {
        match self.view.read().filter {
            SourceFilter::All => BrowseMode::AllSources,
            SourceFilter::Source(_) => BrowseMode::SingleSource,
        }
    }

    // === Cart operations ===

    /// Set a line quantity from a search interaction, resolving the
    /// effective discount for the line
    pub fn set_quantity(&self, item: &Item, field_key: &str, quantity: u32) -> OrderResult<()> {
        let line_key = item.line_key(field_key);
        let percent =
            self.discounts
                .effective_discount(&item.source, Some(&line_key), self.browse_mode());
        self.cart.set_quantity(item, field_key, quantity, percent)
    }

    /// Override one line's discount and re-price it
    pub fn set_line_discount(
        &self,
        item: &Item,
        field_key: &str,
        percent: Decimal,
    ) -> OrderResult<()> {
        let line_key = item.line_key(field_key);
        self.discounts
            .set_line_override(&line_key, &item.source, percent)?;
        self.cart.reprice_line(&line_key, percent)
    }

    /// Change a source's default discount and re-price every cart line
    /// from that source at the new baseline
    pub fn set_source_discount(&self, source: &str, percent: Decimal) -> OrderResult<()> {
        self.discounts.set_source_default(source, percent)?;
        let cart = self.cart.current();
        for (line_key, line) in &cart.lines {
            if line.source == source {
                self.cart.reprice_line(line_key, percent)?;
            }
        }
        Ok(())
    }

    // === Order lifecycle ===

    /// Save the working cart as an order
    ///
    /// A mobile that is given but not 10 digits is a blocking validation
    /// error: nothing is saved, the cart stays as it was. With no mobile
    /// at all (none given, none in the cart metadata) the cart goes
    /// through the unassigned flow: parked under a TEMP key, or moved to
    /// the ORD- fallback when it was already parked. On a definitive
    /// save the cart is cleared for the next customer; a
    /// [`SaveOutcome::NeedsConfirmation`] leaves everything untouched.
    pub fn save_cart(&self, mobile: Option<&str>) -> OrderResult<SaveOutcome> {
        let cart = self.cart.current();
        let now = Utc::now();

        let mobile = match mobile {
            Some(raw) => {
                let normalized = normalize_mobile(raw);
                if !is_valid_mobile(&normalized) {
                    return Err(OrderError::InvalidMobile(raw.to_string()));
                }
                Some(normalized)
            }
            None => cart.meta.mobile.clone(),
        };

        let Some(mobile) = mobile else {
            let key = self
                .orders
                .save_unassigned(cart.meta.editing_key.as_deref(), &cart, now)?;
            self.cart.clear()?;
            return Ok(SaveOutcome::Saved { key });
        };

        let outcome = self
            .orders
            .save(cart.meta.editing_key.as_deref(), &cart, &mobile, now)?;
        if matches!(outcome, SaveOutcome::Saved { .. }) {
            self.cart.clear()?;
        }
        Ok(outcome)
    }

    /// Confirmed resolution of a rekey collision: persist as a new order
    /// and clear the cart
    pub fn confirm_save_as_new(&self, original_key: &str, mobile: &str) -> OrderResult<String> {
        let cart = self.cart.current();
        let key = self
            .orders
            .save_as_new(original_key, &cart, &normalize_mobile(mobile), Utc::now())?;
        self.cart.clear()?;
        Ok(key)
    }

    /// Load an order into the cart for editing
    pub fn load_order(&self, key: &str) -> OrderResult<OrderRecord> {
        let record = self.orders.load(key)?;
        let mut cart = record.cart.clone();
        cart.meta.mobile = (!record.is_temporary).then(|| record.mobile.clone());
        cart.meta.editing_key = Some(key.to_string());
        self.cart.load(cart)?;
        tracing::info!(key = %key, "Order loaded for editing");
        Ok(record)
    }

    /// Drop the working cart and start fresh
    pub fn start_new_order(&self) -> OrderResult<()> {
        self.cart.clear()
    }

    /// All orders, newest first
    pub fn list_orders(&self) -> OrderResult<Vec<OrderSummary>> {
        self.orders.list()
    }

    /// Render an order's summary and hand it to the sink
    pub fn send_summary(&self, sink: &dyn MessageSink, key: &str) -> OrderResult<()> {
        let record = self.orders.load(key)?;
        let text = messaging::order_summary(key, &record.cart);
        sink.send(&record.mobile, &text);
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("catalog", &self.catalog.len())
            .field("cart_lines", &self.cart.line_count())
            .finish()
    }
}
