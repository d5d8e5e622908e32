//! Microsoft SQL Server SQL dialect.
//!
//! The odd one out in several places: bracket quoting, `sp_rename` instead
//! of `ALTER TABLE ... RENAME`, identity columns that refuse explicit values
//! without `SET IDENTITY_INSERT`, and `ALTER COLUMN` calls that fail while
//! any index still references the column.

use crate::core::identifier::{quote_literal, quote_mssql};
use crate::core::schema::{ColumnSpec, ColumnType};
use crate::dialect::{DbType, Dialect};
use crate::error::Result;

/// MSSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MssqlDialect {
    fn db_type(&self) -> DbType {
        DbType::Mssql
    }

    fn quote(&self, name: &str) -> String {
        quote_mssql(name)
    }

    fn column_type_sql(&self, col: &ColumnSpec) -> String {
        match col.col_type {
            ColumnType::Bool => "BIT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Int => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "FLOAT".to_string(),
            ColumnType::Varchar(len) => format!("NVARCHAR({})", len),
            ColumnType::Text => "NVARCHAR(MAX)".to_string(),
            ColumnType::Blob => "VARBINARY(MAX)".to_string(),
            ColumnType::Timestamp => "DATETIME2".to_string(),
        }
    }

    fn auto_increment_clause(&self) -> &'static str {
        "IDENTITY(1,1)"
    }

    fn add_column_keyword(&self) -> &'static str {
        ""
    }

    fn drop_index_sql(&self, table_name: &str, index_name: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote(index_name),
            self.quote(table_name)
        )
    }

    fn rename_table_sql(&self, from: &str, to: &str) -> String {
        // sp_rename carries the table's constraints to the new name.
        format!(
            "EXEC sp_rename {}, {}",
            quote_literal(from),
            quote_literal(to)
        )
    }

    fn modify_column_sql(&self, table_name: &str, col: &ColumnSpec) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ALTER COLUMN {} {} {}",
            self.quote(table_name),
            self.quote(&col.name),
            self.column_type_sql(col),
            if col.nullable { "NULL" } else { "NOT NULL" }
        ))
    }

    fn table_exists_sql(&self, _database: &str, _schema: Option<&str>, table: &str) -> String {
        format!(
            "SELECT name FROM sys.tables WHERE name = {}",
            quote_literal(table)
        )
    }

    fn list_columns_sql(&self, _database: &str, _schema: Option<&str>, table: &str) -> String {
        format!(
            "SELECT c.name AS name FROM sys.columns c \
             WHERE c.object_id = OBJECT_ID({}) ORDER BY c.column_id",
            quote_literal(table)
        )
    }

    fn list_indexes_sql(&self, _database: &str, _schema: Option<&str>, table: &str) -> String {
        format!(
            "SELECT name FROM sys.indexes \
             WHERE object_id = OBJECT_ID({}) AND name IS NOT NULL",
            quote_literal(table)
        )
    }
}
