//! Centralized identifier validation and quoting.
//!
//! SQL identifiers (table names, column names, index names) cannot be passed
//! as parameters in prepared statements, so every engine primitive builds DDL
//! text from identifiers. This module provides a single, well-tested set of
//! functions for validating and quoting them per engine.

use crate::error::{MigrateError, Result};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
/// - SQLite: effectively unlimited
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier for structural issues.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes (injection vector)
/// - Identifiers exceeding maximum length
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::config("Identifier cannot be empty"));
    }

    if name.contains('\0') {
        return Err(MigrateError::config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote a PostgreSQL or SQLite identifier.
///
/// Both engines use double quotes; embedded double quotes are doubled.
pub fn quote_double(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a MySQL identifier using backticks.
pub fn quote_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a SQL Server identifier using brackets.
pub fn quote_mssql(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Quote a string value as a SQL literal (single quotes doubled).
///
/// Used for identifier values appearing in catalog queries
/// (`WHERE tablename = '...'`), never for user data.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("my_table").is_ok());
        assert!(validate_identifier("Table123").is_ok());
        assert!(validate_identifier("column with spaces").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let result = validate_identifier("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let result = validate_identifier("table\0name");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_rejects_too_long() {
        let long_name = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        let result = validate_identifier(&long_name);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("maximum length"));
    }

    // =========================================================================
    // Quoting tests
    // =========================================================================

    #[test]
    fn test_quote_double_normal() {
        assert_eq!(quote_double("users"), "\"users\"");
        assert_eq!(quote_double("table\"name"), "\"table\"\"name\"");
    }

    #[test]
    fn test_quote_mysql_escapes_backtick() {
        assert_eq!(quote_mysql("users"), "`users`");
        assert_eq!(quote_mysql("table`name"), "`table``name`");
    }

    #[test]
    fn test_quote_mssql_escapes_bracket() {
        assert_eq!(quote_mssql("users"), "[users]");
        assert_eq!(quote_mssql("table]name"), "[table]]name]");
    }

    #[test]
    fn test_quote_literal_doubles_single_quotes() {
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
        assert_eq!(quote_literal("plain"), "'plain'");
    }

    #[test]
    fn test_quote_injection_safely_quoted() {
        assert_eq!(
            quote_double("Robert'); DROP TABLE Students;--"),
            "\"Robert'); DROP TABLE Students;--\""
        );
        assert_eq!(
            quote_mssql("Robert]; DROP TABLE Students;--"),
            "[Robert]]; DROP TABLE Students;--]"
        );
    }
}
