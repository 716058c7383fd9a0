//! Order key generation and parsing
//!
//! Key forms:
//!
//! | Form | Example | Meaning |
//! |------|---------|---------|
//! | `{mobile}/{YY}{MM}/{serial:03}` | `9876543210/2504/001` | permanent order |
//! | `TEMP/{RFC3339}` | `TEMP/2025-04-01T10:00:00+00:00` | cart saved before a mobile is known |
//! | `ORD-{epoch-ms}` | `ORD-1743501600000` | cart never associated with a valid mobile |
//!
//! Serials are scoped per mobile+month and zero-padded to 3 digits so
//! keys within one scope sort lexicographically.

use super::error::{OrderError, OrderResult};
use chrono::{DateTime, Datelike, Utc};
use shared::util::is_valid_mobile;

/// Marker prefix for temporary orders
pub const TEMP_PREFIX: &str = "TEMP/";

/// Marker prefix for fallback orders
pub const FALLBACK_PREFIX: &str = "ORD-";

/// Serial zero-pad width
pub const SERIAL_WIDTH: usize = 3;

/// Parsed order key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderKey {
    Permanent {
        mobile: String,
        /// `{YY}{MM}` scope period
        period: String,
        serial: u32,
    },
    Temporary {
        timestamp: String,
    },
    Fallback {
        epoch_ms: i64,
    },
}

impl OrderKey {
    /// Parse a stored key string into its form
    pub fn parse(key: &str) -> Option<Self> {
        if let Some(ts) = key.strip_prefix(TEMP_PREFIX) {
            return Some(Self::Temporary {
                timestamp: ts.to_string(),
            });
        }
        if let Some(ms) = key.strip_prefix(FALLBACK_PREFIX) {
            return ms.parse().ok().map(|epoch_ms| Self::Fallback { epoch_ms });
        }
        let mut parts = key.split('/');
        let mobile = parts.next()?;
        let period = parts.next()?;
        let serial = parts.next()?;
        if parts.next().is_some() || !is_valid_mobile(mobile) || period.len() != 4 {
            return None;
        }
        Some(Self::Permanent {
            mobile: mobile.to_string(),
            period: period.to_string(),
            serial: serial.parse().ok()?,
        })
    }

    pub fn is_temporary(key: &str) -> bool {
        key.starts_with(TEMP_PREFIX)
    }

    pub fn is_fallback(key: &str) -> bool {
        key.starts_with(FALLBACK_PREFIX)
    }

    /// Keys that get replaced by a permanent key on the next save
    pub fn is_promotable(key: &str) -> bool {
        Self::is_temporary(key) || Self::is_fallback(key)
    }
}

/// Scope prefix for one mobile's orders in the current month:
/// `"{mobile}/{YY}{MM}/"`
pub fn scope_prefix(mobile: &str, now: DateTime<Utc>) -> String {
    format!("{}/{:02}{:02}/", mobile, now.year() % 100, now.month())
}

/// Format a permanent key from its parts
pub fn format_key(mobile: &str, now: DateTime<Utc>, serial: u32) -> String {
    format!(
        "{}{:0width$}",
        scope_prefix(mobile, now),
        serial,
        width = SERIAL_WIDTH
    )
}

/// Next free serial in a scope: `max(existing) + 1`, starting at 1
pub fn next_serial<'a>(prefix: &str, existing_keys: impl IntoIterator<Item = &'a str>) -> u32 {
    existing_keys
        .into_iter()
        .filter_map(|k| k.strip_prefix(prefix))
        .filter_map(|serial| serial.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

/// Generate a unique permanent key for this mobile against the current
/// order set
///
/// Fails with `InvalidMobile` unless the mobile is exactly 10 digits.
/// Two generations racing before either is persisted may compute the same
/// serial; the save step detects and resolves that collision.
pub fn generate_key<'a>(
    mobile: &str,
    now: DateTime<Utc>,
    existing_keys: impl IntoIterator<Item = &'a str>,
) -> OrderResult<String> {
    if !is_valid_mobile(mobile) {
        return Err(OrderError::InvalidMobile(mobile.to_string()));
    }
    let prefix = scope_prefix(mobile, now);
    let serial = next_serial(&prefix, existing_keys);
    Ok(format!("{}{:0width$}", prefix, serial, width = SERIAL_WIDTH))
}

/// Placeholder key for a cart saved before a mobile is known
pub fn temp_key(now: DateTime<Utc>) -> String {
    format!("{}{}", TEMP_PREFIX, now.to_rfc3339())
}

/// Last-resort key for a cart never associated with a valid mobile
pub fn fallback_key(now: DateTime<Utc>) -> String {
    format!("{}{}", FALLBACK_PREFIX, now.timestamp_millis())
}

/// Candidate key for a mobile-change edit: the new mobile with the
/// original key's period/serial suffix
pub fn rekey_mobile(new_mobile: &str, original_key: &str) -> OrderResult<String> {
    if !is_valid_mobile(new_mobile) {
        return Err(OrderError::InvalidMobile(new_mobile.to_string()));
    }
    match OrderKey::parse(original_key) {
        Some(OrderKey::Permanent { period, serial, .. }) => Ok(format!(
            "{}/{}/{:0width$}",
            new_mobile,
            period,
            serial,
            width = SERIAL_WIDTH
        )),
        _ => Err(OrderError::OrderNotFound(original_key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn april() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_first_key_of_scope_is_001() {
        let key = generate_key("9876543210", april(), []).unwrap();
        assert_eq!(key, "9876543210/2504/001");
    }

    #[test]
    fn test_serial_increments_within_scope() {
        let existing = ["9876543210/2504/001", "9876543210/2504/002"];
        let key = generate_key("9876543210", april(), existing).unwrap();
        assert_eq!(key, "9876543210/2504/003");
    }

    #[test]
    fn test_serial_scope_is_per_mobile() {
        // Another mobile's orders in the same month do not advance this
        // mobile's serial
        let existing = ["9988776655/2504/007"];
        let key = generate_key("9876543210", april(), existing).unwrap();
        assert_eq!(key, "9876543210/2504/001");
    }

    #[test]
    fn test_serial_scope_is_per_month() {
        let existing = ["9876543210/2503/004"];
        let key = generate_key("9876543210", april(), existing).unwrap();
        assert_eq!(key, "9876543210/2504/001");
    }

    #[test]
    fn test_invalid_mobile_rejected() {
        assert!(matches!(
            generate_key("98765", april(), []),
            Err(OrderError::InvalidMobile(_))
        ));
        assert!(matches!(
            generate_key("98765abc10", april(), []),
            Err(OrderError::InvalidMobile(_))
        ));
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            OrderKey::parse("9876543210/2504/012"),
            Some(OrderKey::Permanent {
                mobile: "9876543210".to_string(),
                period: "2504".to_string(),
                serial: 12,
            })
        );
        assert!(matches!(
            OrderKey::parse("TEMP/2025-04-01T10:00:00+00:00"),
            Some(OrderKey::Temporary { .. })
        ));
        assert_eq!(
            OrderKey::parse("ORD-1743501600000"),
            Some(OrderKey::Fallback {
                epoch_ms: 1743501600000
            })
        );
        assert_eq!(OrderKey::parse("not/a/key"), None);
        assert_eq!(OrderKey::parse(""), None);
    }

    #[test]
    fn test_rekey_mobile_keeps_period_and_serial() {
        let candidate = rekey_mobile("9988776655", "9876543210/2504/001").unwrap();
        assert_eq!(candidate, "9988776655/2504/001");
    }

    #[test]
    fn test_temp_and_fallback_markers() {
        assert!(OrderKey::is_temporary(&temp_key(april())));
        assert!(OrderKey::is_fallback(&fallback_key(april())));
        assert!(OrderKey::is_promotable(&temp_key(april())));
        assert!(!OrderKey::is_promotable("9876543210/2504/001"));
    }
}
