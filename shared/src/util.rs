use chrono::{DateTime, Utc};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current UTC timestamp as an RFC3339 string
///
/// Order records store their `created_at`/`updated_at` in this form.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Parse an RFC3339 timestamp to milliseconds, mapping failures to epoch 0
///
/// Order listings sort by this value descending, so records with a
/// damaged or missing timestamp sink to the end instead of aborting the
/// listing.
pub fn timestamp_or_epoch(ts: &str) -> i64 {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Strip non-digits from a mobile input and keep the last 10 digits,
/// so a country-code prefix does not displace the number itself
pub fn normalize_mobile(input: &str) -> String {
    let digits: Vec<char> = input.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(10);
    digits[start..].iter().collect()
}

/// A valid customer mobile is exactly 10 ASCII digits
pub fn is_valid_mobile(mobile: &str) -> bool {
    mobile.len() == 10 && mobile.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_validation() {
        assert!(is_valid_mobile("9876543210"));
        assert!(!is_valid_mobile("987654321"));
        assert!(!is_valid_mobile("98765432100"));
        assert!(!is_valid_mobile("98765abc10"));
        assert!(!is_valid_mobile(""));
    }

    #[test]
    fn test_normalize_mobile() {
        assert_eq!(normalize_mobile("+91 98765-43210"), "9876543210");
        assert_eq!(normalize_mobile("9876543210"), "9876543210");
        assert_eq!(normalize_mobile("43210"), "43210");
    }

    #[test]
    fn test_timestamp_or_epoch() {
        assert!(timestamp_or_epoch("2025-04-01T10:00:00+00:00") > 0);
        assert_eq!(timestamp_or_epoch("not a date"), 0);
        assert_eq!(timestamp_or_epoch(""), 0);
    }
}
