// Modified: 2026-03-14

//! Utility functions shared across the Privguard platform.

use crate::types::Timestamp;
use sha2::{Digest, Sha256};

/// Generate a new UUID v4
pub fn generate_uuid() -> uuid::Uuid {
    uuid::Uuid::new_v4()
}

/// Get current UTC timestamp
pub fn current_timestamp() -> Timestamp {
    chrono::Utc::now()
}

/// SHA-256 of the input, hex-encoded
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize a matched value for deduplication: lower-case, strip spaces
/// and hyphens. "ABCDE 1234-F" and "abcde1234f" hash identically.
pub fn normalize_match_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Strip NUL bytes from scanner-supplied text. Returns the sanitized
/// string and the number of bytes removed; the count is recorded in
/// ScanRun metadata.
pub fn strip_nul(input: &str) -> (String, usize) {
    let stripped: String = input.chars().filter(|c| *c != '\0').collect();
    let removed = input.len() - stripped.len();
    (stripped, removed)
}

/// Format timestamp as ISO 8601 string
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.to_rfc3339()
}

/// Parse ISO 8601 timestamp string
pub fn parse_timestamp(timestamp_str: &str) -> crate::types::Result<Timestamp> {
    chrono::DateTime::parse_from_rfc3339(timestamp_str)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| {
            crate::error::Error::validation(format!(
                "Invalid timestamp format '{timestamp_str}': {e}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_match_value() {
        assert_eq!(normalize_match_value("ABCDE 1234-F"), "abcde1234f");
        assert_eq!(normalize_match_value("4111-1111-1111-1111"), "4111111111111111");
        assert_eq!(normalize_match_value("already-clean"), "alreadyclean");
    }

    #[test]
    fn test_normalized_values_hash_identically() {
        let a = sha256_hex(&normalize_match_value("ABCDE 1234-F"));
        let b = sha256_hex(&normalize_match_value("abcde1234f"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_strip_nul() {
        let (clean, removed) = strip_nul("ab\0cd\0");
        assert_eq!(clean, "abcd");
        assert_eq!(removed, 2);

        let (clean, removed) = strip_nul("no nulls here");
        assert_eq!(clean, "no nulls here");
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_sha256_hex_is_stable() {
        assert_eq!(
            sha256_hex("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_timestamp_round_trip() {
        let now = current_timestamp();
        let parsed = parse_timestamp(&format_timestamp(&now)).unwrap();
        assert!((now.timestamp_millis() - parsed.timestamp_millis()).abs() < 1);
    }
}
