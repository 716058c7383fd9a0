use std::path::PathBuf;

/// Engine configuration
///
/// # Environment variables
///
/// Every setting can be overridden through the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./work_dir | Working directory (database, logs) |
/// | CATALOG_DIR | ./catalog | Directory of catalog JSON files |
/// | LOG_LEVEL | info | Log level filter |
/// | PAGE_SIZE | 20 | Search results shown per page |
/// | DEBOUNCE_MS | 250 | Search input settle window (milliseconds) |
/// | ENVIRONMENT | development | development \| staging \| production |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/shopdesk LOG_LEVEL=debug cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and logs
    pub work_dir: String,
    /// Directory of catalog JSON files, one source per file
    pub catalog_dir: String,
    /// Log level filter
    pub log_level: String,
    /// Search results shown per page
    pub page_size: usize,
    /// Search input settle window, milliseconds
    pub debounce_ms: u64,
    /// Runtime environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to their defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            catalog_dir: std::env::var("CATALOG_DIR").unwrap_or_else(|_| "./catalog".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            page_size: std::env::var("PAGE_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(20),
            debounce_ms: std::env::var("DEBOUNCE_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(250),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the directories, keeping the rest from the environment
    ///
    /// Mostly for tests
    pub fn with_overrides(work_dir: impl Into<String>, catalog_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.catalog_dir = catalog_dir.into();
        config
    }

    /// Path of the embedded database file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("shopdesk.redb")
    }

    /// Directory for file logging
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
