//! Search pipeline
//!
//! - **engine**: free-text AND matching over the item index, with
//!   whole-number semantics for numeric terms and a paging cursor
//! - **debounce**: keystroke coalescing so rapid input runs one query

pub mod debounce;
pub mod engine;

pub use debounce::SearchDebouncer;
pub use engine::{Pager, SearchEngine, SearchOutcome, SourceFilter};
