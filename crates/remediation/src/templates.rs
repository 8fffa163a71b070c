//! Masking templates.
//!
//! Per-pattern-family masking used by Mask actions and Preview. Templates
//! preserve enough trailing characters to keep records recognizable
//! without exposing the value.

/// Masked rendition of a value for the given pattern
pub fn mask_value(pattern_name: &str, original: &str) -> String {
    match pattern_name {
        "CREDIT_CARD" | "BANK_ACCOUNT" => keep_last(original, 4, 'X'),
        "IN_AADHAAR" | "IN_PAN" | "IN_PASSPORT" | "IN_VOTER_ID" | "IN_DRIVING_LICENSE" => {
            keep_last(original, 4, 'X')
        }
        "EMAIL" => mask_email(original),
        "PHONE" => keep_last(original, 2, '*'),
        "API_KEY" | "AWS_ACCESS_KEY" | "AWS_SECRET_KEY" | "PASSWORD" | "JWT" | "PRIVATE_KEY"
        | "SECRET_KEY" => "[REDACTED]".to_string(),
        _ => keep_last(original, 2, '*'),
    }
}

/// Replace all but the trailing `keep` characters, preserving separators
fn keep_last(value: &str, keep: usize, mask_char: char) -> String {
    let chars: Vec<char> = value.chars().collect();
    let cutoff = chars.len().saturating_sub(keep);
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i >= cutoff || *c == '-' || *c == ' ' {
                *c
            } else {
                mask_char
            }
        })
        .collect()
}

/// Mask the local part of an email, keeping its first character
fn mask_email(value: &str) -> String {
    match value.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().unwrap_or('*');
            format!("{first}****@{domain}")
        }
        None => keep_last(value, 2, '*'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_keeps_last_four() {
        assert_eq!(mask_value("CREDIT_CARD", "4111-1111-1111-1234"), "XXXX-XXXX-XXXX-1234");
    }

    #[test]
    fn test_aadhaar_keeps_last_four() {
        assert_eq!(mask_value("IN_AADHAAR", "2345 6789 0123"), "XXXX XXXX 0123");
    }

    #[test]
    fn test_email_keeps_domain() {
        assert_eq!(mask_value("EMAIL", "arjun@example.com"), "a****@example.com");
    }

    #[test]
    fn test_secrets_fully_redacted() {
        assert_eq!(mask_value("API_KEY", "sk_live_abc123"), "[REDACTED]");
    }

    #[test]
    fn test_default_keeps_last_two() {
        assert_eq!(mask_value("PERSON_NAME", "Asha"), "**ha");
    }
}
