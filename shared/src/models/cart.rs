//! Cart model
//!
//! Metadata (target mobile, order-in-progress key) lives in a dedicated
//! `meta` struct next to the line map, so iteration and totals can never
//! mistake it for a priced line.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Monetary values are rounded to 2 decimal places, half-up
pub const DECIMAL_PLACES: u32 = 2;

/// One priced row within a cart: an item snapshot plus the chosen price
/// field, discount and quantity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Item identity key
    pub item_id: String,
    /// Originating catalog source
    pub source: String,
    /// Display snapshot of the item's fields at add time
    pub fields: BTreeMap<String, Value>,
    /// Which price-bearing field this line was built from
    pub field_key: String,
    /// Undiscounted price read from `field_key`
    #[serde(with = "rust_decimal::serde::float")]
    pub raw_price: Decimal,
    /// Effective discount percentage applied to this line
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_percent: Decimal,
    pub quantity: u32,
    /// `round2(raw_price * (1 - discount/100))`
    #[serde(with = "rust_decimal::serde::float")]
    pub final_price: Decimal,
}

impl CartLine {
    /// Line total: `quantity * final_price`, rounded to 2 decimals
    pub fn line_total(&self) -> Decimal {
        (self.final_price * Decimal::from(self.quantity))
            .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Best-effort display name from the field snapshot
    pub fn display_name(&self) -> String {
        for key in ["NAME", "PARTICULARS", "DESCRIPTION", "name", "particulars", "description"] {
            if let Some(Value::String(s)) = self.fields.get(key) {
                if !s.is_empty() {
                    return s.clone();
                }
            }
        }
        self.item_id.clone()
    }
}

/// Cart metadata, kept structurally separate from the line map
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrderMeta {
    /// Target customer mobile, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    /// Key of the order being edited, when the cart was loaded from one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editing_key: Option<String>,
}

/// The working cart: line-key -> line, plus metadata
///
/// Exactly one cart is current at a time within a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub lines: BTreeMap<String, CartLine>,
    #[serde(default)]
    pub meta: OrderMeta,
}

impl Cart {
    /// Sum of `quantity * final_price` over all lines, 2 decimals
    pub fn total(&self) -> Decimal {
        self.lines
            .values()
            .map(CartLine::line_total)
            .sum::<Decimal>()
            .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn line(qty: u32, final_price: &str) -> CartLine {
        CartLine {
            item_id: "X1".to_string(),
            source: "wire.json".to_string(),
            fields: BTreeMap::from([("NAME".to_string(), json!("Wire"))]),
            field_key: "RATE".to_string(),
            raw_price: Decimal::from_str(final_price).unwrap(),
            discount_percent: Decimal::ZERO,
            quantity: qty,
            final_price: Decimal::from_str(final_price).unwrap(),
        }
    }

    #[test]
    fn test_total_sums_lines_only() {
        let mut cart = Cart::default();
        cart.lines.insert("X1-RATE".to_string(), line(2, "10.50"));
        cart.lines.insert("X1-DLP".to_string(), line(3, "4.10"));
        // Metadata must not contribute to the total
        cart.meta.mobile = Some("9876543210".to_string());
        cart.meta.editing_key = Some("9876543210/2504/001".to_string());

        assert_eq!(cart.total(), Decimal::from_str("33.30").unwrap());
    }

    #[test]
    fn test_total_empty_cart_is_zero() {
        assert_eq!(Cart::default().total(), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_rounds_to_two_decimals() {
        let mut l = line(3, "3.33");
        l.final_price = Decimal::from_str("3.335").unwrap();
        assert_eq!(l.line_total(), Decimal::from_str("10.01").unwrap());
    }

    #[test]
    fn test_meta_survives_roundtrip() {
        let mut cart = Cart::default();
        cart.meta.mobile = Some("9876543210".to_string());
        cart.lines.insert("X1-RATE".to_string(), line(1, "5"));

        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back.meta.mobile.as_deref(), Some("9876543210"));
        assert_eq!(back.lines.len(), 1);
    }
}
