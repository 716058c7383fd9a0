//! Engine core: configuration and the session facade

pub mod config;
pub mod state;

pub use config::Config;
pub use state::Session;
