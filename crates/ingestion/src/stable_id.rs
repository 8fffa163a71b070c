//! Stable asset identity.
//!
//! Relational sources normalize to `data_source "::" host "::" schema.table`
//! with the column stripped; file sources use the raw path. The normalized
//! identifier is lowercased and SHA-256-hashed to a hex string, unique per
//! tenant.

use privguard_core::types::SourceType;
use privguard_core::utils::sha256_hex;

/// Parsed `<connection> > schema.table.column` database locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbLocator {
    pub connection: Option<String>,
    /// `schema.table` with the column stripped
    pub schema_table: String,
    pub column: Option<String>,
}

/// Parse the scanner's database locator form. Tolerates a missing
/// connection prefix and a missing column segment.
pub fn parse_db_locator(locator: &str) -> DbLocator {
    let (connection, qualified) = match locator.split_once('>') {
        Some((conn, rest)) => (Some(conn.trim().to_string()), rest.trim()),
        None => (None, locator.trim()),
    };

    let parts: Vec<&str> = qualified.split('.').collect();
    let (schema_table, column) = match parts.as_slice() {
        [schema, table, column, ..] => (format!("{schema}.{table}"), Some((*column).to_string())),
        [schema, table] => (format!("{schema}.{table}"), None),
        _ => (qualified.to_string(), None),
    };

    DbLocator {
        connection,
        schema_table,
        column,
    }
}

/// Compute the stable id for an asset locator
pub fn compute_stable_id(
    source_type: SourceType,
    data_source: &str,
    host: &str,
    locator: &str,
) -> String {
    let normalized = if source_type.is_relational() {
        let parsed = parse_db_locator(locator);
        format!("{data_source}::{host}::{}", parsed.schema_table)
    } else {
        locator.to_string()
    };
    sha256_hex(&normalized.to_lowercase())
}

/// Display name for an asset: the table for relational sources, the
/// final path segment for files.
pub fn asset_display_name(source_type: SourceType, locator: &str) -> String {
    if source_type.is_relational() {
        parse_db_locator(locator).schema_table
    } else {
        locator
            .rsplit(['/', '\\'])
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(locator)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_locator() {
        let parsed = parse_db_locator("billing > public.customers.email");
        assert_eq!(parsed.connection.as_deref(), Some("billing"));
        assert_eq!(parsed.schema_table, "public.customers");
        assert_eq!(parsed.column.as_deref(), Some("email"));
    }

    #[test]
    fn test_parse_without_connection_or_column() {
        let parsed = parse_db_locator("public.customers");
        assert_eq!(parsed.connection, None);
        assert_eq!(parsed.schema_table, "public.customers");
        assert_eq!(parsed.column, None);
    }

    #[test]
    fn test_column_is_stripped_from_stable_id() {
        let a = compute_stable_id(
            SourceType::Postgresql,
            "billing",
            "db-01",
            "billing > public.customers.email",
        );
        let b = compute_stable_id(
            SourceType::Postgresql,
            "billing",
            "db-01",
            "billing > public.customers.phone",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_stable_id_is_case_insensitive() {
        let a = compute_stable_id(SourceType::Filesystem, "nfs", "files-01", "/Data/Users.CSV");
        let b = compute_stable_id(SourceType::Filesystem, "nfs", "files-01", "/data/users.csv");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_hosts_differ() {
        let a = compute_stable_id(SourceType::Mysql, "crm", "db-01", "crm > app.users.name");
        let b = compute_stable_id(SourceType::Mysql, "crm", "db-02", "crm > app.users.name");
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            asset_display_name(SourceType::Postgresql, "billing > public.customers.email"),
            "public.customers"
        );
        assert_eq!(
            asset_display_name(SourceType::Filesystem, "/data/users/export.csv"),
            "export.csv"
        );
    }
}
