//! Locked pattern-name scope and curated keyword sets.
//!
//! The classifier accepts only a fixed set of pattern-name aliases (the
//! tenant-facing locked PII types). Candidates whose pattern name
//! normalizes outside this set are rejected at ingestion and never reach
//! the classifier.

use privguard_core::ClassificationType;

/// Normalize a scanner-supplied pattern name for locked-type lookup:
/// uppercase, spaces and dashes collapsed to underscores.
pub fn normalize_pattern_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' | '.' => '_',
            _ => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Resolve a normalized pattern name to its canonical locked type,
/// collapsing known aliases. Returns None outside the locked scope.
pub fn canonical_locked_type(normalized: &str) -> Option<&'static str> {
    let canonical = match normalized {
        "IN_AADHAAR" | "AADHAAR" | "AADHAR" => "IN_AADHAAR",
        "IN_PAN" | "PAN" | "PAN_NUMBER" => "IN_PAN",
        "IN_PASSPORT" | "PASSPORT" | "PASSPORT_NUMBER" => "IN_PASSPORT",
        "IN_VOTER_ID" | "VOTER_ID" | "EPIC" => "IN_VOTER_ID",
        "IN_DRIVING_LICENSE" | "DRIVING_LICENSE" | "DRIVING_LICENCE" => "IN_DRIVING_LICENSE",
        "CREDIT_CARD" | "IN_CREDIT_CARD" | "CARD_NUMBER" => "CREDIT_CARD",
        "BANK_ACCOUNT" | "IN_BANK_ACCOUNT" | "ACCOUNT_NUMBER" => "BANK_ACCOUNT",
        "IFSC" | "IN_IFSC" | "IFSC_CODE" => "IFSC",
        "UPI_ID" | "IN_UPI" | "UPI" => "UPI_ID",
        "EMAIL" | "EMAIL_ADDRESS" => "EMAIL",
        "PHONE" | "PHONE_NUMBER" | "IN_PHONE" | "MOBILE_NUMBER" => "PHONE",
        "PERSON_NAME" | "NAME" | "FULL_NAME" => "PERSON_NAME",
        "ADDRESS" | "POSTAL_ADDRESS" => "ADDRESS",
        "IP_ADDRESS" | "IPV4" | "IPV6" => "IP_ADDRESS",
        "DATE_OF_BIRTH" | "DOB" => "DATE_OF_BIRTH",
        "API_KEY" | "APIKEY" => "API_KEY",
        "AWS_ACCESS_KEY" | "AWS_KEY" => "AWS_ACCESS_KEY",
        "AWS_SECRET_KEY" | "AWS_SECRET" => "AWS_SECRET_KEY",
        "PASSWORD" | "PASSWD" => "PASSWORD",
        "JWT" | "JWT_TOKEN" | "BEARER_TOKEN" => "JWT",
        "PRIVATE_KEY" | "SSH_KEY" | "PEM_KEY" => "PRIVATE_KEY",
        "SECRET_KEY" | "GENERIC_SECRET" => "SECRET_KEY",
        _ => return None,
    };
    Some(canonical)
}

/// Locked type scope: accept a pattern name against the configured
/// allowlist (the built-in canonical set when the allowlist is empty).
/// Returns the canonical name on acceptance.
pub fn validate_locked_type(name: &str, allowlist: &[String]) -> Option<String> {
    let canonical = canonical_locked_type(&normalize_pattern_name(name))?;
    if allowlist.is_empty() || allowlist.iter().any(|a| a == canonical) {
        Some(canonical.to_string())
    } else {
        None
    }
}

/// Classification type and sub-category for a canonical locked type.
/// Government IDs and card numbers are Sensitive Personal Data; contact
/// identifiers are Personal Data; credential-like types are Secrets.
pub fn classification_for(canonical: &str) -> (ClassificationType, &'static str) {
    match canonical {
        "IN_AADHAAR" | "IN_PAN" | "IN_PASSPORT" | "IN_VOTER_ID" | "IN_DRIVING_LICENSE" => {
            (ClassificationType::SensitivePersonal, "government_id")
        }
        "CREDIT_CARD" | "BANK_ACCOUNT" | "IFSC" | "UPI_ID" => {
            (ClassificationType::SensitivePersonal, "financial")
        }
        "DATE_OF_BIRTH" => (ClassificationType::SensitivePersonal, "demographic"),
        "EMAIL" | "PHONE" | "PERSON_NAME" | "ADDRESS" => {
            (ClassificationType::Personal, "contact")
        }
        "IP_ADDRESS" => (ClassificationType::Personal, "network"),
        "API_KEY" | "AWS_ACCESS_KEY" | "AWS_SECRET_KEY" | "PASSWORD" | "JWT" | "PRIVATE_KEY"
        | "SECRET_KEY" => (ClassificationType::Secrets, "credential"),
        _ => (ClassificationType::NonPii, "unclassified"),
    }
}

/// Whether the entropy signal applies: credential-like or token-shaped
/// pattern names only.
pub fn is_secret_shaped(canonical: &str) -> bool {
    matches!(
        classification_for(canonical).0,
        ClassificationType::Secrets
    ) || canonical.contains("TOKEN")
        || canonical.contains("KEY")
}

/// Curated corroboration keywords per classification type, matched
/// against column names and path tokens by the rule signal.
pub fn corroboration_keywords(classification_type: ClassificationType) -> &'static [&'static str] {
    match classification_type {
        ClassificationType::SensitivePersonal => &[
            "identity", "id", "kyc", "aadhaar", "pan", "passport", "card", "account", "customer",
            "user", "billing",
        ],
        ClassificationType::Personal => &[
            "user", "customer", "contact", "email", "phone", "profile", "crm", "name", "address",
        ],
        ClassificationType::Secrets => &[
            "secret", "key", "token", "credential", "config", "vault", "env", "auth",
        ],
        ClassificationType::NonPii => &[],
    }
}

/// Path tokens that mark semantically sensitive asset locations
pub const SEMANTIC_PATH_KEYWORDS: &[&str] =
    &["user", "customer", "billing", "auth", "login", "account"];

/// Split a path or column locator into lowercase tokens
pub fn tokenize(input: &str) -> Vec<String> {
    input
        .split(|c: char| matches!(c, '/' | '\\' | '_' | '-' | '.' | ':' | ' '))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True when any token starts with any keyword ("users" matches "user")
pub fn any_token_matches(tokens: &[String], keywords: &[&str]) -> bool {
    tokens
        .iter()
        .any(|t| keywords.iter().any(|k| t.starts_with(k)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pattern_name() {
        assert_eq!(normalize_pattern_name("in aadhaar"), "IN_AADHAAR");
        assert_eq!(normalize_pattern_name("credit-card"), "CREDIT_CARD");
        assert_eq!(normalize_pattern_name("  Email "), "EMAIL");
    }

    #[test]
    fn test_aliases_collapse() {
        assert_eq!(canonical_locked_type("AADHAAR"), Some("IN_AADHAAR"));
        assert_eq!(canonical_locked_type("PAN_NUMBER"), Some("IN_PAN"));
        assert_eq!(canonical_locked_type("EMAIL_ADDRESS"), Some("EMAIL"));
        assert_eq!(canonical_locked_type("UNKNOWN_PATTERN"), None);
    }

    #[test]
    fn test_locked_scope_with_allowlist() {
        let allow = vec!["IN_PAN".to_string()];
        assert_eq!(validate_locked_type("pan", &allow), Some("IN_PAN".to_string()));
        assert_eq!(validate_locked_type("email", &allow), None);
        // Empty allowlist falls back to the built-in set
        assert_eq!(validate_locked_type("email", &[]), Some("EMAIL".to_string()));
    }

    #[test]
    fn test_classification_table() {
        assert_eq!(
            classification_for("IN_AADHAAR").0,
            ClassificationType::SensitivePersonal
        );
        assert_eq!(
            classification_for("CREDIT_CARD").0,
            ClassificationType::SensitivePersonal
        );
        assert_eq!(classification_for("EMAIL").0, ClassificationType::Personal);
        assert_eq!(classification_for("API_KEY").0, ClassificationType::Secrets);
        assert_eq!(classification_for("SOMETHING").0, ClassificationType::NonPii);
    }

    #[test]
    fn test_secret_shaped() {
        assert!(is_secret_shaped("API_KEY"));
        assert!(is_secret_shaped("JWT"));
        assert!(!is_secret_shaped("IN_AADHAAR"));
        assert!(!is_secret_shaped("EMAIL"));
    }

    #[test]
    fn test_tokenize_and_match() {
        let tokens = tokenize("/prod/users/identity.csv");
        assert!(tokens.contains(&"users".to_string()));
        assert!(any_token_matches(&tokens, SEMANTIC_PATH_KEYWORDS));
        assert!(!any_token_matches(&tokenize("/var/log/syslog"), SEMANTIC_PATH_KEYWORDS));
    }
}
