//! Domain errors for the ordering engine

use crate::storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the order, cart and pricing components
#[derive(Debug, Error)]
pub enum OrderError {
    /// Mobile is not exactly 10 digits; surfaced as a blocking validation
    /// message, no state mutated
    #[error("Invalid mobile number: {0:?} (expected exactly 10 digits)")]
    InvalidMobile(String),

    /// Key absent from the store; a non-fatal notice, not a crash
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Discount outside the supported menu (3%-70% in 0.5% steps)
    #[error("Unsupported discount: {0}")]
    InvalidDiscount(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type OrderResult<T> = Result<T, OrderError>;
