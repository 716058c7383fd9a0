//! redb-based persisted store
//!
//! # Tables
//!
//! | Table | Key | Value | Written by |
//! |-------|-----|-------|------------|
//! | `cart` | `"current"` | `Cart` | CartStore |
//! | `orders` | order key | `OrderRecord` | OrderStore |
//! | `all_items` | position | `Item` | catalog loader |
//! | `file_discounts` | source | `Decimal` percent | catalog loader / DiscountEngine |
//!
//! All values are JSON-serialized. Every mutation runs inside one write
//! transaction, so a commit either lands whole or leaves prior state
//! untouched; there are no partial writes for callers to observe.
//!
//! The store is built for one session at a time. Two processes sharing
//! the same file are serialized by redb, but the ordering semantics this
//! engine needs (a key generation observing all prior saves) only hold
//! within a single session.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use rust_decimal::Decimal;
use shared::models::{Cart, Item, OrderRecord};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Working cart: key = "current", value = JSON-serialized Cart
const CART_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cart");

/// Persisted orders: key = order key, value = JSON-serialized OrderRecord
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Flattened catalog: key = load position (preserves catalog order),
/// value = JSON-serialized Item
const ITEMS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("all_items");

/// Per-source default discounts: key = source id, value = JSON-serialized Decimal
const FILE_DISCOUNTS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("file_discounts");

const CURRENT_CART_KEY: &str = "current";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Persisted store backed by redb
///
/// All component access routes through this one handle; components never
/// reach into the database ad hoc.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(CART_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ITEMS_TABLE)?;
            let _ = write_txn.open_table(FILE_DISCOUNTS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction for multi-step order mutations
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Cart ==========

    /// Load the current working cart (empty if none has been saved yet)
    pub fn load_cart(&self) -> StorageResult<Cart> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CART_TABLE)?;
        match table.get(CURRENT_CART_KEY)? {
            Some(guard) => Ok(serde_json::from_slice(guard.value())?),
            None => Ok(Cart::default()),
        }
    }

    /// Persist the whole working cart
    pub fn save_cart(&self, cart: &Cart) -> StorageResult<()> {
        let bytes = serde_json::to_vec(cart)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CART_TABLE)?;
            table.insert(CURRENT_CART_KEY, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // ========== Catalog items ==========

    /// Replace the flattened catalog wholesale
    pub fn replace_items(&self, items: &[Item]) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            write_txn.delete_table(ITEMS_TABLE)?;
            let mut table = write_txn.open_table(ITEMS_TABLE)?;
            for (idx, item) in items.iter().enumerate() {
                let bytes = serde_json::to_vec(item)?;
                table.insert(idx as u64, bytes.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load the flattened catalog in its original order
    pub fn load_items(&self) -> StorageResult<Vec<Item>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ITEMS_TABLE)?;
        let mut items = Vec::new();
        for entry in table.iter()? {
            let (_, guard) = entry?;
            items.push(serde_json::from_slice(guard.value())?);
        }
        Ok(items)
    }

    // ========== Source discounts ==========

    /// Persist one source's default discount percent
    pub fn set_source_discount(&self, source: &str, percent: Decimal) -> StorageResult<()> {
        let bytes = serde_json::to_vec(&percent)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(FILE_DISCOUNTS_TABLE)?;
            table.insert(source, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load all persisted per-source default discounts
    pub fn source_discounts(&self) -> StorageResult<BTreeMap<String, Decimal>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FILE_DISCOUNTS_TABLE)?;
        let mut discounts = BTreeMap::new();
        for entry in table.iter()? {
            let (key, guard) = entry?;
            let percent: Decimal = serde_json::from_slice(guard.value())?;
            discounts.insert(key.value().to_string(), percent);
        }
        Ok(discounts)
    }

    // ========== Orders ==========

    /// Load one order record
    pub fn get_order(&self, key: &str) -> StorageResult<Option<OrderRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All order keys currently in the store
    pub fn order_keys(&self) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut keys = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    /// All orders as (key, record) pairs
    pub fn all_orders(&self) -> StorageResult<Vec<(String, OrderRecord)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for entry in table.iter()? {
            let (key, guard) = entry?;
            orders.push((key.value().to_string(), serde_json::from_slice(guard.value())?));
        }
        Ok(orders)
    }

    /// Persist one order in its own transaction
    pub fn put_order(&self, key: &str, record: &OrderRecord) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        self.put_order_txn(&write_txn, key, record)?;
        write_txn.commit()?;
        Ok(())
    }

    /// Delete one order; returns whether the key existed
    pub fn delete_order(&self, key: &str) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = self.delete_order_txn(&write_txn, key)?;
        write_txn.commit()?;
        Ok(existed)
    }

    // ========== Order operations within a caller-owned transaction ==========
    //
    // The save flows (collision check, temp promotion, mobile-change edit)
    // must read keys and write records atomically; callers begin one write
    // transaction, compose these, and commit.

    /// Order keys visible to this transaction
    pub fn order_keys_txn(&self, txn: &WriteTransaction) -> StorageResult<Vec<String>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        let mut keys = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    /// Load one order within this transaction
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        key: &str,
    ) -> StorageResult<Option<OrderRecord>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Upsert one order within this transaction
    pub fn put_order_txn(
        &self,
        txn: &WriteTransaction,
        key: &str,
        record: &OrderRecord,
    ) -> StorageResult<()> {
        let bytes = serde_json::to_vec(record)?;
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.insert(key, bytes.as_slice())?;
        Ok(())
    }

    /// Delete one order within this transaction; returns whether it existed
    pub fn delete_order_txn(&self, txn: &WriteTransaction, key: &str) -> StorageResult<bool> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        Ok(table.remove(key)?.is_some())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("db", &"<redb::Database>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CartLine, OrderMeta};
    use shared::util::now_rfc3339;
    use std::str::FromStr;

    fn sample_cart() -> Cart {
        let mut cart = Cart::default();
        cart.lines.insert(
            "X1-RATE".to_string(),
            CartLine {
                item_id: "X1".to_string(),
                source: "wire.json".to_string(),
                fields: BTreeMap::new(),
                field_key: "RATE".to_string(),
                raw_price: Decimal::from(100),
                discount_percent: Decimal::from(10),
                quantity: 2,
                final_price: Decimal::from(90),
            },
        );
        cart.meta = OrderMeta {
            mobile: Some("9876543210".to_string()),
            editing_key: None,
        };
        cart
    }

    fn sample_record() -> OrderRecord {
        OrderRecord {
            cart: sample_cart(),
            mobile: "9876543210".to_string(),
            created_at: now_rfc3339(),
            updated_at: None,
            serial: 1,
            is_temporary: false,
        }
    }

    #[test]
    fn test_cart_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.load_cart().unwrap().is_empty());

        let cart = sample_cart();
        store.save_cart(&cart).unwrap();
        assert_eq!(store.load_cart().unwrap(), cart);
    }

    #[test]
    fn test_order_put_get_delete() {
        let store = Store::open_in_memory().unwrap();
        let record = sample_record();
        store.put_order("9876543210/2504/001", &record).unwrap();

        let loaded = store.get_order("9876543210/2504/001").unwrap().unwrap();
        assert_eq!(loaded, record);

        assert!(store.delete_order("9876543210/2504/001").unwrap());
        assert!(!store.delete_order("9876543210/2504/001").unwrap());
        assert!(store.get_order("9876543210/2504/001").unwrap().is_none());
    }

    #[test]
    fn test_items_preserve_catalog_order() {
        let store = Store::open_in_memory().unwrap();
        let items: Vec<Item> = (0..5)
            .map(|i| {
                Item::from_fields(
                    "wire.json",
                    i,
                    None,
                    BTreeMap::from([(
                        "NAME".to_string(),
                        serde_json::json!(format!("item {}", i)),
                    )]),
                )
            })
            .collect();
        store.replace_items(&items).unwrap();
        assert_eq!(store.load_items().unwrap(), items);

        // Replacing drops the previous catalog entirely
        store.replace_items(&items[..2]).unwrap();
        assert_eq!(store.load_items().unwrap().len(), 2);
    }

    #[test]
    fn test_source_discounts_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        store
            .set_source_discount("wire.json", Decimal::from_str("12.5").unwrap())
            .unwrap();
        store
            .set_source_discount("plates.json", Decimal::from(30))
            .unwrap();

        let discounts = store.source_discounts().unwrap();
        assert_eq!(discounts.len(), 2);
        assert_eq!(discounts["wire.json"], Decimal::from_str("12.5").unwrap());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shopdesk.redb");
        {
            let store = Store::open(&path).unwrap();
            store.put_order("9876543210/2504/001", &sample_record()).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert!(store.get_order("9876543210/2504/001").unwrap().is_some());
    }
}
