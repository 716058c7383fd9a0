//! Persisted order model

use super::Cart;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Mobile placeholder for orders saved before a number was known
pub const UNKNOWN_MOBILE: &str = "unknown";

/// One persisted order: a cart frozen under an order key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRecord {
    pub cart: Cart,
    /// 10-digit mobile, or [`UNKNOWN_MOBILE`] for temporary orders
    pub mobile: String,
    /// RFC3339; fixed at first save, preserved across edits
    pub created_at: String,
    /// RFC3339; refreshed on every save after the first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Serial within the mobile+month key scope (0 for temporary orders)
    pub serial: u32,
    #[serde(default)]
    pub is_temporary: bool,
}

/// Listing row for the order browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub key: String,
    pub mobile: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub created_at: String,
}
