//! PostgreSQL SQL dialect.
//!
//! Auto-increment columns render as serial types, which create the
//! `<table>_<column>_seq` sequences the rebuild engine snapshots and
//! restores across a copy-and-swap.

use crate::core::identifier::{quote_double, quote_literal};
use crate::core::schema::{ColumnSpec, ColumnType};
use crate::dialect::{DbType, Dialect};
use crate::error::Result;

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn db_type(&self) -> DbType {
        DbType::Postgres
    }

    fn quote(&self, name: &str) -> String {
        quote_double(name)
    }

    fn column_type_sql(&self, col: &ColumnSpec) -> String {
        if col.auto_increment {
            return match col.col_type {
                ColumnType::SmallInt => "SMALLSERIAL".to_string(),
                ColumnType::BigInt => "BIGSERIAL".to_string(),
                _ => "SERIAL".to_string(),
            };
        }
        match col.col_type {
            ColumnType::Bool => "BOOLEAN".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Int => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Varchar(len) => format!("VARCHAR({})", len),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Blob => "BYTEA".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    fn drop_table_sql(&self, table_name: &str) -> String {
        // CASCADE drops the dependent constraints with the table.
        format!("DROP TABLE {} CASCADE", self.quote(table_name))
    }

    fn modify_column_sql(&self, table_name: &str, col: &ColumnSpec) -> Result<String> {
        let table = self.quote(table_name);
        let column = self.quote(&col.name);
        let mut actions = vec![format!(
            "ALTER COLUMN {} TYPE {}",
            column,
            self.column_type_sql(col)
        )];
        actions.push(format!(
            "ALTER COLUMN {} {} NOT NULL",
            column,
            if col.nullable { "DROP" } else { "SET" }
        ));
        if let Some(default) = &col.default {
            if !default.is_empty() {
                actions.push(format!("ALTER COLUMN {} SET DEFAULT {}", column, default));
            }
        }
        Ok(format!("ALTER TABLE {} {}", table, actions.join(", ")))
    }

    fn table_exists_sql(&self, database: &str, schema: Option<&str>, table: &str) -> String {
        format!(
            "SELECT table_name AS name FROM information_schema.tables \
             WHERE table_catalog = {} AND table_schema = {} AND table_name = {}",
            quote_literal(database),
            quote_literal(schema.unwrap_or("public")),
            quote_literal(table)
        )
    }

    fn list_columns_sql(&self, database: &str, schema: Option<&str>, table: &str) -> String {
        format!(
            "SELECT column_name AS name FROM information_schema.columns \
             WHERE table_catalog = {} AND table_schema = {} AND table_name = {} \
             ORDER BY ordinal_position",
            quote_literal(database),
            quote_literal(schema.unwrap_or("public")),
            quote_literal(table)
        )
    }

    fn list_indexes_sql(&self, _database: &str, schema: Option<&str>, table: &str) -> String {
        format!(
            "SELECT indexname AS name FROM pg_indexes \
             WHERE schemaname = {} AND tablename = {}",
            quote_literal(schema.unwrap_or("public")),
            quote_literal(table)
        )
    }
}
