use shopdesk_core::{Config, DirLoader, Session, init_logger_with_file};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv, config)
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // 2. Logging (JSON + file logs in production, console otherwise)
    let log_dir = config.log_dir();
    init_logger_with_file(
        &config.log_level,
        config.is_production(),
        config.is_production().then(|| log_dir.to_string_lossy()).as_deref(),
    )?;

    tracing::info!("Shopdesk engine starting...");

    // 3. Session over the persisted store
    let session = Session::initialize(&config)?;

    // 4. Catalog ingestion
    let loader = DirLoader::new(&config.catalog_dir);
    match session.load_catalog(&loader, false) {
        Ok(0) => {}
        Ok(failed) => tracing::warn!(failed, "Catalog loaded with failures"),
        Err(e) => tracing::error!(error = %e, "Catalog load failed, using persisted items"),
    }

    tracing::info!(
        items = session.catalog().len(),
        sources = session.catalog().sources().len(),
        orders = session.list_orders()?.len(),
        cart_lines = session.cart().line_count(),
        "Shopdesk engine ready"
    );

    Ok(())
}
