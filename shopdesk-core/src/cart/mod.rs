//! Working cart store
//!
//! Holds the one current cart, persists it whole on every mutation, and
//! notifies subscribers synchronously after each successful change (cart
//! badge, total display). The persistence write completes before the
//! mutating call returns, so a following order save always reads the
//! final cart.

use crate::orders::error::OrderResult;
use crate::pricing;
use crate::storage::Store;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use shared::models::{Cart, CartLine, Item};

/// Callback invoked after every successful cart mutation
pub type CartObserver = Box<dyn Fn(&Cart) + Send + Sync>;

/// Largest accepted line quantity; higher requests are clamped
pub const MAX_QUANTITY: u32 = 1200;

/// Mutable mapping of line-key -> cart line, persisted via the store
pub struct CartStore {
    store: Store,
    cart: RwLock<Cart>,
    observers: RwLock<Vec<CartObserver>>,
}

impl CartStore {
    /// Resume the persisted cart, or start empty
    pub fn new(store: Store) -> OrderResult<Self> {
        let cart = store.load_cart()?;
        Ok(Self {
            store,
            cart: RwLock::new(cart),
            observers: RwLock::new(Vec::new()),
        })
    }

    /// Register a change observer; called synchronously after each
    /// successful mutation
    pub fn subscribe(&self, observer: impl Fn(&Cart) + Send + Sync + 'static) {
        self.observers.write().push(Box::new(observer));
    }

    /// Upsert a priced line from a search interaction
    ///
    /// Recomputes `final_price` from the raw price and the effective
    /// discount the caller resolved. Quantity 0 removes the line.
    pub fn set_quantity(
        &self,
        item: &Item,
        field_key: &str,
        quantity: u32,
        discount_percent: Decimal,
    ) -> OrderResult<()> {
        let line_key = item.line_key(field_key);
        let Some(raw_price) = item.price_in(field_key) else {
            tracing::warn!(line_key = %line_key, "Ignoring quantity for non-price field");
            return Ok(());
        };

        let quantity = if quantity > MAX_QUANTITY {
            tracing::warn!(line_key = %line_key, requested = quantity, "Quantity clamped");
            MAX_QUANTITY
        } else {
            quantity
        };

        let mut cart = self.current();
        if quantity == 0 {
            cart.lines.remove(&line_key);
        } else {
            cart.lines.insert(
                line_key,
                CartLine {
                    item_id: item.id.clone(),
                    source: item.source.clone(),
                    fields: item.fields.clone(),
                    field_key: field_key.to_string(),
                    raw_price,
                    discount_percent,
                    quantity,
                    final_price: pricing::final_price(raw_price, discount_percent),
                },
            );
        }
        self.commit(cart)
    }

    /// Re-price one existing line at a new discount percent
    ///
    /// No-op when the line is not in the cart.
    pub fn reprice_line(&self, line_key: &str, discount_percent: Decimal) -> OrderResult<()> {
        let mut cart = self.current();
        let Some(line) = cart.lines.get_mut(line_key) else {
            return Ok(());
        };
        line.discount_percent = discount_percent;
        line.final_price = pricing::final_price(line.raw_price, discount_percent);
        self.commit(cart)
    }

    /// Remove one line
    pub fn remove_line(&self, line_key: &str) -> OrderResult<()> {
        let mut cart = self.current();
        cart.lines.remove(line_key);
        self.commit(cart)
    }

    /// Drop all lines and metadata; fires exactly one notification
    pub fn clear(&self) -> OrderResult<()> {
        self.commit(Cart::default())
    }

    /// Replace the current cart (loading an order for editing)
    pub fn load(&self, new_cart: Cart) -> OrderResult<()> {
        self.commit(new_cart)
    }

    /// Record the target mobile in the cart metadata
    pub fn set_mobile(&self, mobile: Option<String>) -> OrderResult<()> {
        let mut cart = self.current();
        cart.meta.mobile = mobile;
        self.commit(cart)
    }

    /// Snapshot of the current cart
    pub fn current(&self) -> Cart {
        self.cart.read().clone()
    }

    /// Sum of `quantity * final_price` over all lines, 2 decimals
    pub fn total(&self) -> Decimal {
        self.cart.read().total()
    }

    pub fn line_count(&self) -> usize {
        self.cart.read().len()
    }

    /// Persist first, then swap in-memory state and notify. A failed
    /// write leaves the prior cart fully intact and reaches no observer.
    /// Observers run outside the cart lock and may call back in.
    fn commit(&self, new_cart: Cart) -> OrderResult<()> {
        self.store.save_cart(&new_cart)?;
        *self.cart.write() = new_cart.clone();
        for observer in self.observers.read().iter() {
            observer(&new_cart);
        }
        Ok(())
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.cart.read().len())
            .field("observers", &self.observers.read().len())
            .finish()
    }
}
