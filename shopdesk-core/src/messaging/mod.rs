//! Order hand-off boundary
//!
//! The engine renders a plain-text order summary and hands it to a
//! [`MessageSink`] together with the customer mobile. What the sink does
//! with it (WhatsApp deep link, SMS gateway) is outside the engine;
//! [`LogSink`] just records the hand-off.

use shared::models::Cart;

/// Render a cart as a shareable plain-text summary
///
/// One line per item in cart order, then the total:
///
/// ```text
/// Order ORD123
/// Copper Wire - ₹118.75 × 2
/// Total: ₹237.50
/// ```
pub fn order_summary(key: &str, cart: &Cart) -> String {
    let mut out = format!("Order {}\n", key);
    for line in cart.lines.values() {
        out.push_str(&format!(
            "{} - ₹{:.2} × {}\n",
            line.display_name(),
            line.final_price,
            line.quantity
        ));
    }
    out.push_str(&format!("Total: ₹{:.2}", cart.total()));
    out
}

/// Delivery boundary for rendered summaries
pub trait MessageSink: Send + Sync {
    fn send(&self, mobile: &str, text: &str);
}

/// Sink that only logs the hand-off
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn send(&self, mobile: &str, text: &str) {
        tracing::info!(mobile = %mobile, chars = text.len(), "Order summary handed off");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use shared::models::{CartLine, Item};
    use std::collections::BTreeMap;

    fn cart_with(name: &str, price: &str, qty: u32) -> Cart {
        let item = Item::from_fields(
            "wire.json",
            0,
            None,
            BTreeMap::from([("NAME".to_string(), json!(name)), ("RATE".to_string(), json!(100))]),
        );
        let final_price: Decimal = price.parse().unwrap();
        let line = CartLine {
            item_id: item.id.clone(),
            source: item.source.clone(),
            fields: item.fields.clone(),
            field_key: "RATE".to_string(),
            raw_price: Decimal::from(100),
            discount_percent: Decimal::ZERO,
            quantity: qty,
            final_price,
        };
        let mut cart = Cart::default();
        cart.lines.insert(item.line_key("RATE"), line);
        cart
    }

    #[test]
    fn test_summary_lists_lines_and_total() {
        let cart = cart_with("Copper Wire", "118.75", 2);
        let text = order_summary("9876543210/2604/001", &cart);

        assert!(text.starts_with("Order 9876543210/2604/001\n"));
        assert!(text.contains("Copper Wire - ₹118.75 × 2"));
        assert!(text.ends_with("Total: ₹237.50"));
    }

    #[test]
    fn test_empty_cart_summary_has_zero_total() {
        let text = order_summary("TEMP/2026-04-01T00:00:00Z", &Cart::default());
        assert!(text.ends_with("Total: ₹0.00"));
    }
}
