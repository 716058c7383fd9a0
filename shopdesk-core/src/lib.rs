//! Shopdesk Core - retail ordering and persistence engine
//!
//! The engine behind a clerk-facing pricelist tool: search a multi-source
//! product catalog, apply per-item discounts, build a working cart, and
//! persist carts as retrievable orders keyed by customer mobile number.
//!
//! # Module structure
//!
//! ```text
//! shopdesk-core/src/
//! ├── core/          # Config, session state
//! ├── common/        # Logging setup
//! ├── storage/       # redb-backed persisted store
//! ├── catalog/       # Item index + catalog loader boundary
//! ├── search/        # Query pipeline, pagination, debounce
//! ├── pricing/       # Discount resolution and final price
//! ├── cart/          # Working cart with change notifications
//! ├── orders/        # Order keys and the order store
//! └── messaging/     # Order summary handoff boundary
//! ```
//!
//! # Data flow
//!
//! ItemIndex → SearchEngine → CartStore → OrderKey → OrderStore, with
//! OrderStore feeding back into CartStore when an existing order is
//! loaded for editing.

pub mod cart;
pub mod catalog;
pub mod common;
pub mod core;
pub mod messaging;
pub mod orders;
pub mod pricing;
pub mod search;
pub mod storage;

// Re-export public types
pub use cart::CartStore;
pub use catalog::{CatalogLoad, CatalogLoader, DirLoader, ItemIndex};
pub use core::{Config, Session};
pub use messaging::{LogSink, MessageSink, order_summary};
pub use orders::{OrderError, OrderKey, OrderResult, OrderStore, SaveOutcome, generate_key};
pub use pricing::{BrowseMode, DiscountEngine};
pub use search::{Pager, SearchDebouncer, SearchEngine, SearchOutcome, SourceFilter};
pub use storage::{Store, StorageError};

// Re-export logger functions
pub use common::logger::{init_logger, init_logger_with_file};
