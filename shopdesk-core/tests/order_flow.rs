//! End-to-end flows: catalog load, search, cart, order lifecycle

use rust_decimal::Decimal;
use shopdesk_core::{
    Config, DirLoader, SaveOutcome, SearchOutcome, Session, SourceFilter, Store,
};

fn write_catalog(dir: &std::path::Path) {
    std::fs::write(
        dir.join("wire.json"),
        r#"[
            {"CODE": "W1", "NAME": "Copper Wire 12 mm", "RATE": 100},
            {"CODE": "W2", "NAME": "Copper Wire 120 mm", "RATE": 160},
            {"CODE": "W3", "NAME": "Aluminium Wire 12 mm", "RATE": 60}
        ]"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("plates.json"),
        r#"{"Modular Plates": [
            {"CODE": "P1", "NAME": "2M Plate", "DLP": 45.5, "RATE": 40}
        ]}"#,
    )
    .unwrap();
}

fn session_with_catalog() -> (Session, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());
    let session = Session::in_memory().unwrap();
    let failed = session
        .load_catalog(&DirLoader::new(dir.path()), false)
        .unwrap();
    assert_eq!(failed, 0);
    (session, dir)
}

#[test]
fn search_to_cart_to_saved_order() {
    let (session, _dir) = session_with_catalog();

    // Numeric terms match whole numbers: "12" skips the 120 mm wire
    let SearchOutcome::Results(hits) = session.search("copper 12") else {
        panic!("expected results");
    };
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "W1");

    // All-sources browsing applies the 10% fallback
    session.set_quantity(&hits[0], "RATE", 2).unwrap();
    assert_eq!(session.cart().total(), Decimal::from(180));

    let SaveOutcome::Saved { key } = session.save_cart(Some("9876543210")).unwrap() else {
        panic!("expected Saved");
    };
    assert!(key.starts_with("9876543210/"));
    assert!(key.ends_with("/001"));

    // Saving cleared the cart for the next customer
    assert!(session.cart().current().is_empty());

    let listed = session.list_orders().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].total, Decimal::from(180));
}

#[test]
fn temporary_order_promotion() {
    let (session, _dir) = session_with_catalog();

    let SearchOutcome::Results(hits) = session.search("plate") else {
        panic!("expected results");
    };
    session.set_quantity(&hits[0], "RATE", 1).unwrap();

    // No mobile yet: parked under a TEMP key
    let SaveOutcome::Saved { key: temp } = session.save_cart(None).unwrap() else {
        panic!("expected Saved");
    };
    assert!(temp.starts_with("TEMP/"));

    // Customer comes back with a number
    session.load_order(&temp).unwrap();
    let SaveOutcome::Saved { key } = session.save_cart(Some("9988776655")).unwrap() else {
        panic!("expected Saved");
    };
    assert!(key.starts_with("9988776655/"));
    assert!(session.orders().load(&temp).is_err());

    let record = session.orders().load(&key).unwrap();
    assert!(!record.is_temporary);
    assert_eq!(record.cart.lines.len(), 1);
}

#[test]
fn mobile_change_collision_needs_confirmation() {
    let (session, _dir) = session_with_catalog();
    let SearchOutcome::Results(hits) = session.search("copper wire") else {
        panic!("expected results");
    };

    // First customer claims serial 001 for their month
    session.set_quantity(&hits[0], "RATE", 1).unwrap();
    let SaveOutcome::Saved { .. } = session.save_cart(Some("9988776655")).unwrap() else {
        panic!("expected Saved");
    };

    // Second order, later edited onto the first customer's mobile
    session.set_quantity(&hits[1], "RATE", 3).unwrap();
    let SaveOutcome::Saved { key: original } = session.save_cart(Some("9876543210")).unwrap()
    else {
        panic!("expected Saved");
    };

    session.load_order(&original).unwrap();
    let outcome = session.save_cart(Some("9988776655")).unwrap();
    let SaveOutcome::NeedsConfirmation { original_key, candidate_key } = outcome else {
        panic!("expected NeedsConfirmation");
    };
    assert_eq!(original_key, original);
    assert!(candidate_key.starts_with("9988776655/"));

    // Nothing moved yet; the clerk confirms, getting a fresh serial
    assert_eq!(session.orders().load(&original).unwrap().mobile, "9876543210");
    let new_key = session
        .confirm_save_as_new(&original, "9988776655")
        .unwrap();
    assert!(new_key.ends_with("/002"));
    assert!(session.orders().load(&original).is_err());
    assert!(session.cart().current().is_empty());
}

#[test]
fn single_source_browsing_changes_fallback_discount() {
    let (session, _dir) = session_with_catalog();

    let outcome = session.set_filter(SourceFilter::Source("wire.json".to_string()));
    // Selected source with an empty query shows the whole source
    let SearchOutcome::Results(hits) = outcome else {
        panic!("expected results");
    };
    assert_eq!(hits.len(), 3);

    session.set_quantity(&hits[0], "RATE", 1).unwrap();
    // 30% single-source fallback on a 100 raw price
    assert_eq!(session.cart().total(), Decimal::from(70));
}

#[test]
fn state_survives_restart() {
    let work = tempfile::tempdir().unwrap();
    let catalog_dir = tempfile::tempdir().unwrap();
    write_catalog(catalog_dir.path());
    let config = Config::with_overrides(
        work.path().to_string_lossy(),
        catalog_dir.path().to_string_lossy(),
    );

    let key = {
        let session = Session::initialize(&config).unwrap();
        session
            .load_catalog(&DirLoader::new(&config.catalog_dir), false)
            .unwrap();

        let SearchOutcome::Results(hits) = session.search("copper 12") else {
            panic!("expected results");
        };
        session.set_quantity(&hits[0], "RATE", 2).unwrap();
        let SaveOutcome::Saved { key } = session.save_cart(Some("9876543210")).unwrap() else {
            panic!("expected Saved");
        };

        // Leave an unsaved cart behind as well
        session.set_quantity(&hits[0], "RATE", 5).unwrap();
        key
    };

    // Fresh session over the same store: catalog, orders and the working
    // cart all come back without reloading catalog files
    let session = Session::initialize(&config).unwrap();
    assert_eq!(session.catalog().len(), 4);
    assert_eq!(session.orders().load(&key).unwrap().mobile, "9876543210");
    assert_eq!(session.cart().line_count(), 1);
    assert_eq!(session.cart().current().lines["W1-RATE"].quantity, 5);
}

#[test]
fn store_opens_existing_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shopdesk.redb");
    {
        let store = Store::open(&path).unwrap();
        drop(store);
    }
    assert!(path.exists());
    Store::open(&path).unwrap();
}
