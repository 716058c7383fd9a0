//! Catalog loader boundary
//!
//! The engine only consumes the flat result; where the items came from
//! and how bespoke file shapes are parsed is the loader's business.
//! [`DirLoader`] is the default implementation: it flattens generic
//! JSON files (arrays of objects, or objects whose keys group entries)
//! from one directory.

use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{CatalogFileError, Item};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Result of one catalog load
#[derive(Debug, Clone, Default)]
pub struct CatalogLoad {
    pub items: Vec<Item>,
    /// Per-source default discount percents shipped with the catalog
    pub source_discounts: BTreeMap<String, Decimal>,
    /// Per-file failures; loading continues past them
    pub errors: Vec<CatalogFileError>,
}

/// Boundary for catalog ingestion
pub trait CatalogLoader {
    /// Load the whole catalog; `force_refresh` bypasses any cache the
    /// loader keeps
    fn load(&self, force_refresh: bool) -> CatalogLoad;
}

/// Loads `*.json` files from a directory, one source per file
#[derive(Debug, Clone)]
pub struct DirLoader {
    dir: PathBuf,
}

impl DirLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load_file(&self, file_name: &str, load: &mut CatalogLoad) {
        let path = self.dir.join(file_name);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                load.errors.push(CatalogFileError {
                    file: file_name.to_string(),
                    error: e.to_string(),
                });
                return;
            }
        };
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                load.errors.push(CatalogFileError {
                    file: file_name.to_string(),
                    error: e.to_string(),
                });
                return;
            }
        };
        flatten(&value, file_name, &mut load.items);
    }
}

impl CatalogLoader for DirLoader {
    fn load(&self, _force_refresh: bool) -> CatalogLoad {
        let mut load = CatalogLoad::default();
        let mut files: Vec<String> = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(".json"))
                .collect(),
            Err(e) => {
                load.errors.push(CatalogFileError {
                    file: self.dir.display().to_string(),
                    error: e.to_string(),
                });
                return load;
            }
        };
        files.sort();
        for file in &files {
            self.load_file(file, &mut load);
        }
        load
    }
}

/// Flatten a generic JSON document into items
///
/// - array of objects: items without a category
/// - object of arrays: each key becomes the category of its entries
/// - object of objects: each value becomes one item, keyed category
fn flatten(value: &Value, source: &str, items: &mut Vec<Item>) {
    let mut index = items.len();
    let mut push = |fields: &serde_json::Map<String, Value>, category: Option<&str>| {
        let fields: BTreeMap<String, Value> =
            fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        items.push(Item::from_fields(
            source,
            index,
            category.map(str::to_string),
            fields,
        ));
        index += 1;
    };

    match value {
        Value::Array(entries) => {
            for entry in entries {
                if let Value::Object(fields) = entry {
                    push(fields, None);
                }
            }
        }
        Value::Object(groups) => {
            for (key, group) in groups {
                match group {
                    Value::Array(entries) => {
                        for entry in entries {
                            if let Value::Object(fields) = entry {
                                push(fields, Some(key));
                            }
                        }
                    }
                    Value::Object(fields) => push(fields, Some(key)),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}
