//! Discount resolution and final price computation
//!
//! Resolution order for a line's effective discount:
//!
//! 1. explicit per-line override
//! 2. per-source default (persisted in `file_discounts`)
//! 3. global default — 10% when browsing all sources, 30% when a single
//!    source is selected
//!
//! Changing a source's default is a deliberate bulk re-price: it clears
//! every per-line override for that source so all its lines fall back to
//! the new baseline.

use crate::orders::error::{OrderError, OrderResult};
use crate::storage::Store;
use parking_lot::RwLock;
use rust_decimal::prelude::*;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Monetary rounding: 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

/// Supported discount menu bounds, in whole/half percent steps
pub const DISCOUNT_MIN: &str = "3.0";
pub const DISCOUNT_MAX: &str = "70.0";
pub const DISCOUNT_STEP: &str = "0.5";

/// Which browse mode the clerk is in; it selects the global fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseMode {
    /// Browsing the whole catalog: fallback 10%
    AllSources,
    /// One source selected: fallback 30%
    SingleSource,
}

impl BrowseMode {
    fn default_discount(self) -> Decimal {
        match self {
            BrowseMode::AllSources => Decimal::from(10),
            BrowseMode::SingleSource => Decimal::from(30),
        }
    }
}

/// The discount menu offered to the clerk: 3% to 70% in 0.5% steps
pub fn discount_menu() -> Vec<Decimal> {
    let min = Decimal::from_str(DISCOUNT_MIN).unwrap_or_default();
    let max = Decimal::from_str(DISCOUNT_MAX).unwrap_or_default();
    let step = Decimal::from_str(DISCOUNT_STEP).unwrap_or(Decimal::ONE);
    let mut menu = Vec::new();
    let mut current = min;
    while current <= max {
        menu.push(current);
        current += step;
    }
    menu
}

/// Reject discounts outside the supported menu
pub fn validate_discount(percent: Decimal) -> OrderResult<()> {
    let min = Decimal::from_str(DISCOUNT_MIN).unwrap_or_default();
    let max = Decimal::from_str(DISCOUNT_MAX).unwrap_or_default();
    let step = Decimal::from_str(DISCOUNT_STEP).unwrap_or(Decimal::ONE);
    if percent < min || percent > max || (percent % step) != Decimal::ZERO {
        return Err(OrderError::InvalidDiscount(percent.to_string()));
    }
    Ok(())
}

/// Final price for a raw price at a discount percent, rounded to 2
/// decimals half-up
pub fn final_price(raw_price: Decimal, percent: Decimal) -> Decimal {
    let factor = Decimal::ONE - percent / Decimal::from(100);
    (raw_price * factor)
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Resolves effective discounts for cart lines
pub struct DiscountEngine {
    store: Store,
    /// Per-source defaults, mirrored from the `file_discounts` table
    source_defaults: RwLock<BTreeMap<String, Decimal>>,
    /// Per-line overrides: line key -> (source, percent); session state
    line_overrides: RwLock<BTreeMap<String, (String, Decimal)>>,
}

impl DiscountEngine {
    /// Build the engine, warming the source-default cache from the store
    pub fn new(store: Store) -> OrderResult<Self> {
        let defaults = store.source_discounts()?;
        Ok(Self {
            store,
            source_defaults: RwLock::new(defaults),
            line_overrides: RwLock::new(BTreeMap::new()),
        })
    }

    /// Effective discount for one line
    pub fn effective_discount(
        &self,
        source: &str,
        line_key: Option<&str>,
        mode: BrowseMode,
    ) -> Decimal {
        if let Some(key) = line_key {
            if let Some((_, percent)) = self.line_overrides.read().get(key) {
                return *percent;
            }
        }
        if let Some(percent) = self.source_defaults.read().get(source) {
            return *percent;
        }
        mode.default_discount()
    }

    /// Record a per-line override
    pub fn set_line_override(
        &self,
        line_key: &str,
        source: &str,
        percent: Decimal,
    ) -> OrderResult<()> {
        validate_discount(percent)?;
        self.line_overrides
            .write()
            .insert(line_key.to_string(), (source.to_string(), percent));
        Ok(())
    }

    /// Set a source's default discount and clear that source's per-line
    /// overrides (bulk re-price)
    pub fn set_source_default(&self, source: &str, percent: Decimal) -> OrderResult<()> {
        validate_discount(percent)?;
        self.store.set_source_discount(source, percent)?;
        self.source_defaults
            .write()
            .insert(source.to_string(), percent);

        let mut overrides = self.line_overrides.write();
        let before = overrides.len();
        overrides.retain(|_, (line_source, _)| line_source != source);
        let cleared = before - overrides.len();
        if cleared > 0 {
            tracing::info!(source = %source, cleared, "Source default changed, line overrides reset");
        }
        Ok(())
    }

    /// Replace the cached defaults after a catalog (re)load
    pub fn reload_source_defaults(&self) -> OrderResult<()> {
        let defaults = self.store.source_discounts()?;
        *self.source_defaults.write() = defaults;
        Ok(())
    }
}

impl std::fmt::Debug for DiscountEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscountEngine")
            .field("source_defaults", &self.source_defaults.read().len())
            .field("line_overrides", &self.line_overrides.read().len())
            .finish()
    }
}
