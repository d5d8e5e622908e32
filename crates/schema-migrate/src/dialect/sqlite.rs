//! SQLite SQL dialect.
//!
//! SQLite has the thinnest native ALTER support of the four engines: no
//! `DROP COLUMN` in the supported version range and no column modification
//! at all. Those operations go through full table rewrites driven by the
//! engine primitives; this strategy only contributes the syntax.

use crate::core::identifier::{quote_double, quote_literal};
use crate::core::schema::{ColumnSpec, ColumnType};
use crate::dialect::{DbType, Dialect};
use crate::error::{MigrateError, Result};

/// SQLite dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn db_type(&self) -> DbType {
        DbType::Sqlite
    }

    fn quote(&self, name: &str) -> String {
        quote_double(name)
    }

    fn column_type_sql(&self, col: &ColumnSpec) -> String {
        match col.col_type {
            // SQLite's AUTOINCREMENT requires the literal type INTEGER, and
            // integer affinity covers the whole family anyway.
            ColumnType::Bool
            | ColumnType::SmallInt
            | ColumnType::Int
            | ColumnType::BigInt => "INTEGER".to_string(),
            ColumnType::Float | ColumnType::Double => "REAL".to_string(),
            ColumnType::Varchar(_) | ColumnType::Text => "TEXT".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
            ColumnType::Timestamp => "DATETIME".to_string(),
        }
    }

    fn auto_increment_clause(&self) -> &'static str {
        "AUTOINCREMENT"
    }

    fn inline_auto_pk(&self) -> bool {
        true
    }

    fn modify_column_sql(&self, _table_name: &str, _col: &ColumnSpec) -> Result<String> {
        Err(MigrateError::unsupported("modify column", "sqlite"))
    }

    fn table_exists_sql(&self, _database: &str, _schema: Option<&str>, table: &str) -> String {
        format!(
            "SELECT name FROM sqlite_master WHERE type='table' AND name={}",
            quote_literal(table)
        )
    }

    fn list_columns_sql(&self, _database: &str, _schema: Option<&str>, table: &str) -> String {
        format!("SELECT name FROM pragma_table_info({})", quote_literal(table))
    }

    fn list_indexes_sql(&self, _database: &str, _schema: Option<&str>, table: &str) -> String {
        format!("SELECT name FROM pragma_index_list({})", quote_literal(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{IndexSpec, TableSchema};

    fn schema() -> TableSchema {
        TableSchema::new("user")
            .column(ColumnSpec::auto_pk("id"))
            .column(ColumnSpec::new("email", ColumnType::Varchar(255)).not_null())
            .column(
                ColumnSpec::new("is_active", ColumnType::Bool)
                    .not_null()
                    .with_default("0"),
            )
            .index(IndexSpec::unique(&["email"]))
    }

    #[test]
    fn test_create_table_inline_auto_pk() {
        let sql = SqliteDialect::new().create_table_sql("user", &schema());
        assert_eq!(
            sql,
            "CREATE TABLE \"user\" (\
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
             \"email\" TEXT NOT NULL, \
             \"is_active\" INTEGER NOT NULL DEFAULT 0)"
        );
    }

    #[test]
    fn test_create_table_composite_pk_is_table_level() {
        let schema = TableSchema::new("repo_topic")
            .column(ColumnSpec::new("repo_id", ColumnType::BigInt).as_primary_key())
            .column(ColumnSpec::new("topic_id", ColumnType::BigInt).as_primary_key());
        let sql = SqliteDialect::new().create_table_sql("repo_topic", &schema);
        assert!(sql.ends_with("PRIMARY KEY (\"repo_id\", \"topic_id\"))"));
    }

    #[test]
    fn test_create_index_names_follow_convention() {
        let idx = IndexSpec::unique(&["email"]);
        let sql = SqliteDialect::new().create_index_sql("user", &idx);
        assert_eq!(
            sql,
            "CREATE UNIQUE INDEX \"UQE_user_email\" ON \"user\" (\"email\")"
        );
    }

    #[test]
    fn test_modify_column_unsupported() {
        let col = ColumnSpec::new("email", ColumnType::Text);
        let err = SqliteDialect::new()
            .modify_column_sql("user", &col)
            .unwrap_err();
        assert!(err.to_string().contains("not supported on sqlite"));
    }
}
