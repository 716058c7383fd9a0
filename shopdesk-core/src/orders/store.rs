//! Persisted order store
//!
//! Owns the save-time state machine: new orders, temporary-order
//! promotion, in-place edits, and mobile-change edits that need explicit
//! confirmation before another order's key can be reused. Every save runs
//! inside one write transaction so the collision check observes all
//! previously committed saves.

use super::error::{OrderError, OrderResult};
use super::key::{self, OrderKey};
use crate::storage::Store;
use chrono::{DateTime, Utc};
use shared::models::{Cart, OrderRecord, OrderSummary, order::UNKNOWN_MOBILE};
use shared::util::{is_valid_mobile, timestamp_or_epoch};

/// Result of a save attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Persisted under this key
    Saved { key: String },
    /// A mobile-change edit derived a key that already belongs to another
    /// order. Nothing was mutated; the caller either confirms via
    /// [`OrderStore::save_as_new`] or walks away.
    NeedsConfirmation {
        original_key: String,
        candidate_key: String,
    },
}

/// Persisted mapping of order key -> order record
#[derive(Debug, Clone)]
pub struct OrderStore {
    store: Store,
}

impl OrderStore {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Save a cart as an order
    ///
    /// `key` is the order being edited, if any: `None` creates a new
    /// order, a temporary/fallback key is promoted to a permanent one,
    /// and a permanent key is updated in place unless the mobile changed.
    pub fn save(
        &self,
        existing_key: Option<&str>,
        cart: &Cart,
        mobile: &str,
        now: DateTime<Utc>,
    ) -> OrderResult<SaveOutcome> {
        if !is_valid_mobile(mobile) {
            return Err(OrderError::InvalidMobile(mobile.to_string()));
        }

        match existing_key {
            None => self.save_new(cart, mobile, now),
            Some(old) if OrderKey::is_promotable(old) => self.promote(old, cart, mobile, now),
            Some(old) => self.save_edit(old, cart, mobile, now),
        }
    }

    /// New order: generate a key, bump the serial past any collision,
    /// never overwrite silently
    fn save_new(&self, cart: &Cart, mobile: &str, now: DateTime<Utc>) -> OrderResult<SaveOutcome> {
        let txn = self.store.begin_write()?;
        let keys = self.store.order_keys_txn(&txn)?;
        let mut candidate =
            key::generate_key(mobile, now, keys.iter().map(String::as_str))?;
        while self.store.get_order_txn(&txn, &candidate)?.is_some() {
            tracing::warn!(key = %candidate, "Generated key already persisted, bumping serial");
            candidate = key::generate_key(
                mobile,
                now,
                keys.iter().map(String::as_str).chain([candidate.as_str()]),
            )?;
        }

        let record = OrderRecord {
            cart: detached(cart),
            mobile: mobile.to_string(),
            created_at: now.to_rfc3339(),
            updated_at: None,
            serial: serial_of(&candidate),
            is_temporary: false,
        };
        self.store.put_order_txn(&txn, &candidate, &record)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(key = %candidate, "Order saved");
        Ok(SaveOutcome::Saved { key: candidate })
    }

    /// Promote a temporary/fallback order to a permanent key, carrying
    /// the cart and original created_at over unchanged
    fn promote(
        &self,
        old_key: &str,
        cart: &Cart,
        mobile: &str,
        now: DateTime<Utc>,
    ) -> OrderResult<SaveOutcome> {
        let txn = self.store.begin_write()?;
        let previous = self.store.get_order_txn(&txn, old_key)?;
        let keys = self.store.order_keys_txn(&txn)?;
        let new_key = key::generate_key(mobile, now, keys.iter().map(String::as_str))?;

        let created_at = previous
            .map(|r| r.created_at)
            .unwrap_or_else(|| now.to_rfc3339());
        let record = OrderRecord {
            cart: detached(cart),
            mobile: mobile.to_string(),
            created_at,
            updated_at: Some(now.to_rfc3339()),
            serial: serial_of(&new_key),
            is_temporary: false,
        };
        self.store.put_order_txn(&txn, &new_key, &record)?;
        self.store.delete_order_txn(&txn, old_key)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(from = %old_key, to = %new_key, "Temporary order promoted");
        Ok(SaveOutcome::Saved { key: new_key })
    }

    /// Edit an existing permanent order
    fn save_edit(
        &self,
        old_key: &str,
        cart: &Cart,
        mobile: &str,
        now: DateTime<Utc>,
    ) -> OrderResult<SaveOutcome> {
        let txn = self.store.begin_write()?;
        let previous = self
            .store
            .get_order_txn(&txn, old_key)?
            .ok_or_else(|| OrderError::OrderNotFound(old_key.to_string()))?;

        let same_mobile = matches!(
            OrderKey::parse(old_key),
            Some(OrderKey::Permanent { mobile: m, .. }) if m == mobile
        );

        if same_mobile {
            let record = OrderRecord {
                cart: detached(cart),
                mobile: mobile.to_string(),
                created_at: previous.created_at,
                updated_at: Some(now.to_rfc3339()),
                serial: previous.serial,
                is_temporary: false,
            };
            self.store.put_order_txn(&txn, old_key, &record)?;
            txn.commit().map_err(crate::storage::StorageError::from)?;
            tracing::info!(key = %old_key, "Order updated");
            return Ok(SaveOutcome::Saved {
                key: old_key.to_string(),
            });
        }

        // Mobile changed: keep the original period/serial under the new
        // mobile if that key is free; otherwise hand the decision back.
        let candidate = key::rekey_mobile(mobile, old_key)?;
        if self.store.get_order_txn(&txn, &candidate)?.is_some() {
            drop(txn);
            tracing::warn!(original = %old_key, candidate = %candidate, "Rekey target exists, confirmation required");
            return Ok(SaveOutcome::NeedsConfirmation {
                original_key: old_key.to_string(),
                candidate_key: candidate,
            });
        }

        let record = OrderRecord {
            cart: detached(cart),
            mobile: mobile.to_string(),
            created_at: previous.created_at,
            updated_at: Some(now.to_rfc3339()),
            serial: serial_of(&candidate),
            is_temporary: false,
        };
        // New key is written before the old one goes away, in one commit
        self.store.put_order_txn(&txn, &candidate, &record)?;
        self.store.delete_order_txn(&txn, old_key)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(from = %old_key, to = %candidate, "Order rekeyed to new mobile");
        Ok(SaveOutcome::Saved { key: candidate })
    }

    /// Confirmed resolution of a rekey collision: save as a brand-new
    /// order with a fresh serial for the new mobile+month, then delete
    /// the original
    pub fn save_as_new(
        &self,
        original_key: &str,
        cart: &Cart,
        mobile: &str,
        now: DateTime<Utc>,
    ) -> OrderResult<String> {
        if !is_valid_mobile(mobile) {
            return Err(OrderError::InvalidMobile(mobile.to_string()));
        }
        let txn = self.store.begin_write()?;
        let previous = self
            .store
            .get_order_txn(&txn, original_key)?
            .ok_or_else(|| OrderError::OrderNotFound(original_key.to_string()))?;
        let keys = self.store.order_keys_txn(&txn)?;
        let new_key = key::generate_key(mobile, now, keys.iter().map(String::as_str))?;

        let record = OrderRecord {
            cart: detached(cart),
            mobile: mobile.to_string(),
            created_at: previous.created_at,
            updated_at: Some(now.to_rfc3339()),
            serial: serial_of(&new_key),
            is_temporary: false,
        };
        self.store.put_order_txn(&txn, &new_key, &record)?;
        self.store.delete_order_txn(&txn, original_key)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(from = %original_key, to = %new_key, "Order saved as new after rekey collision");
        Ok(new_key)
    }

    /// Park a cart under a time-based placeholder key until a mobile
    /// number is known
    pub fn save_temporary(&self, cart: &Cart, now: DateTime<Utc>) -> OrderResult<String> {
        let key = key::temp_key(now);
        let record = OrderRecord {
            cart: detached(cart),
            mobile: UNKNOWN_MOBILE.to_string(),
            created_at: now.to_rfc3339(),
            updated_at: None,
            serial: 0,
            is_temporary: true,
        };
        self.store.put_order(&key, &record)?;
        tracing::info!(key = %key, "Temporary order saved");
        Ok(key)
    }

    /// Save a cart that still has no usable mobile
    ///
    /// A first save parks it under a TEMP key. Re-saving a parked order
    /// moves it to the last-resort `ORD-` form (the order exists on its
    /// own now, not just parked), and re-saving an `ORD-` order updates
    /// it in place. Either way there is exactly one record afterwards
    /// and `created_at` carries over.
    pub fn save_unassigned(
        &self,
        existing_key: Option<&str>,
        cart: &Cart,
        now: DateTime<Utc>,
    ) -> OrderResult<String> {
        let Some(old_key) = existing_key.filter(|k| OrderKey::is_promotable(k)) else {
            return self.save_temporary(cart, now);
        };

        let txn = self.store.begin_write()?;
        let Some(previous) = self.store.get_order_txn(&txn, old_key)? else {
            // Stale editing marker; nothing to replace
            drop(txn);
            return self.save_temporary(cart, now);
        };

        let new_key = if OrderKey::is_fallback(old_key) {
            old_key.to_string()
        } else {
            key::fallback_key(now)
        };
        let record = OrderRecord {
            cart: detached(cart),
            mobile: UNKNOWN_MOBILE.to_string(),
            created_at: previous.created_at,
            updated_at: Some(now.to_rfc3339()),
            serial: 0,
            is_temporary: true,
        };
        self.store.put_order_txn(&txn, &new_key, &record)?;
        if new_key != old_key {
            self.store.delete_order_txn(&txn, old_key)?;
        }
        txn.commit().map_err(crate::storage::StorageError::from)?;

        tracing::info!(from = %old_key, to = %new_key, "Unassigned order re-saved");
        Ok(new_key)
    }

    /// Load one order
    pub fn load(&self, key: &str) -> OrderResult<OrderRecord> {
        self.store
            .get_order(key)?
            .ok_or_else(|| OrderError::OrderNotFound(key.to_string()))
    }

    /// Delete one order (destructive; the caller owns confirmation)
    pub fn delete(&self, key: &str) -> OrderResult<()> {
        if self.store.delete_order(key)? {
            tracing::info!(key = %key, "Order deleted");
            Ok(())
        } else {
            Err(OrderError::OrderNotFound(key.to_string()))
        }
    }

    /// All orders, newest first; records with unparseable timestamps sort
    /// as epoch 0 (last)
    pub fn list(&self) -> OrderResult<Vec<OrderSummary>> {
        let mut summaries: Vec<OrderSummary> = self
            .store
            .all_orders()?
            .into_iter()
            .map(|(key, record)| OrderSummary {
                key,
                mobile: record.mobile.clone(),
                total: record.cart.total(),
                created_at: record.created_at,
            })
            .collect();
        summaries.sort_by_key(|s| std::cmp::Reverse(timestamp_or_epoch(&s.created_at)));
        Ok(summaries)
    }

    /// Orders whose key starts with this mobile prefix, newest first
    pub fn find_by_mobile_prefix(&self, prefix: &str) -> OrderResult<Vec<OrderSummary>> {
        let mut summaries = self.list()?;
        summaries.retain(|s| s.key.starts_with(prefix));
        Ok(summaries)
    }
}

/// Cart snapshot for persistence: the editing marker is session state,
/// not part of the stored order
fn detached(cart: &Cart) -> Cart {
    let mut cart = cart.clone();
    cart.meta.editing_key = None;
    cart
}

/// Trailing serial of a permanent key (0 when not parseable)
fn serial_of(key: &str) -> u32 {
    match OrderKey::parse(key) {
        Some(OrderKey::Permanent { serial, .. }) => serial,
        _ => 0,
    }
}
