//! Catalog item model
//!
//! Items come from heterogeneous catalog files, so the model keeps a
//! fixed core (`id`, `source`, `category`, `searchable_text`) plus an
//! open string-keyed extension map for source-specific fields. Consumers
//! iterate `fields` explicitly instead of probing untyped properties.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// One flattened catalog entry
///
/// Immutable once loaded; rebuilt wholesale on catalog (re)load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Identity key: the `CODE` field if present, else `"{source}-{index}"`
    pub id: String,
    /// Originating catalog file / source id
    pub source: String,
    /// Optional grouping label derived from the file structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Lower-cased concatenation of all field values plus category,
    /// used for matching
    pub searchable_text: String,
    /// Source-specific fields as loaded from the catalog file
    pub fields: BTreeMap<String, Value>,
}

impl Item {
    /// Build an item from raw catalog fields
    ///
    /// `index` disambiguates items that carry no `CODE` field.
    pub fn from_fields(
        source: impl Into<String>,
        index: usize,
        category: Option<String>,
        fields: BTreeMap<String, Value>,
    ) -> Self {
        let source = source.into();
        let id = fields
            .get("CODE")
            .map(value_as_text)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| format!("{}-{}", source, index));

        let mut text: String = fields
            .values()
            .map(value_as_text)
            .collect::<Vec<_>>()
            .join(" ");
        if let Some(cat) = &category {
            text.push(' ');
            text.push_str(cat);
        }

        Self {
            id,
            source,
            category,
            searchable_text: text.to_lowercase(),
            fields,
        }
    }

    /// Line key for one priced field of this item: `"{id}-{field}"`
    ///
    /// An item can carry multiple price-bearing fields; each becomes a
    /// separate cart line.
    pub fn line_key(&self, field_key: &str) -> String {
        format!("{}-{}", self.id, field_key)
    }

    /// Read a field as a price, accepting both numbers and numeric strings
    pub fn price_in(&self, field_key: &str) -> Option<Decimal> {
        let value = self.fields.get(field_key)?;
        match value {
            Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    /// Best-effort display name: first of `NAME`, `PARTICULARS`,
    /// `DESCRIPTION`, falling back to the item id
    pub fn display_name(&self) -> String {
        for key in ["NAME", "PARTICULARS", "DESCRIPTION", "name", "particulars", "description"] {
            if let Some(v) = self.fields.get(key) {
                let text = value_as_text(v);
                if !text.is_empty() {
                    return text;
                }
            }
        }
        self.id.clone()
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Per-file catalog load failure
///
/// Collected into a list during loading; never fatal to the session.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{file}: {error}")]
pub struct CatalogFileError {
    pub file: String,
    pub error: String,
}
