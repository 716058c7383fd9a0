//! Order lifecycle and persistence
//!
//! - **key**: order key generation and parsing (mobile + period + serial)
//! - **store**: persisted order records with the save-time state machine
//!
//! # Save flow
//!
//! ```text
//! save(key, cart, mobile)
//!     ├─ no key          → generate, bump serial past collisions, insert
//!     ├─ TEMP/… or ORD-… → promote: fresh permanent key, delete old
//!     ├─ same mobile     → upsert in place, preserve created_at
//!     └─ mobile changed  → derive candidate key with old period/serial
//!            ├─ candidate free   → write candidate, delete old key
//!            └─ candidate taken  → NeedsConfirmation, nothing mutated
//! ```

pub mod error;
pub mod key;
pub mod store;

pub use error::{OrderError, OrderResult};
pub use key::{OrderKey, fallback_key, generate_key, temp_key};
pub use store::{OrderStore, SaveOutcome};
