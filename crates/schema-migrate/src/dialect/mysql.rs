//! MySQL/MariaDB SQL dialect.

use crate::core::identifier::{quote_literal, quote_mysql};
use crate::core::schema::{ColumnSpec, ColumnType};
use crate::dialect::{DbType, Dialect};
use crate::error::Result;

/// MySQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn db_type(&self) -> DbType {
        DbType::Mysql
    }

    fn quote(&self, name: &str) -> String {
        quote_mysql(name)
    }

    fn column_type_sql(&self, col: &ColumnSpec) -> String {
        match col.col_type {
            ColumnType::Bool => "TINYINT(1)".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Int => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Varchar(len) => format!("VARCHAR({})", len),
            ColumnType::Text => "LONGTEXT".to_string(),
            ColumnType::Blob => "LONGBLOB".to_string(),
            ColumnType::Timestamp => "DATETIME".to_string(),
        }
    }

    fn auto_increment_clause(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn drop_index_sql(&self, table_name: &str, index_name: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote(index_name),
            self.quote(table_name)
        )
    }

    fn modify_column_sql(&self, table_name: &str, col: &ColumnSpec) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            self.quote(table_name),
            self.column_def_sql(col)
        ))
    }

    fn table_exists_sql(&self, database: &str, _schema: Option<&str>, table: &str) -> String {
        format!(
            "SELECT TABLE_NAME AS name FROM INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {}",
            quote_literal(database),
            quote_literal(table)
        )
    }

    fn list_columns_sql(&self, database: &str, _schema: Option<&str>, table: &str) -> String {
        format!(
            "SELECT COLUMN_NAME AS name FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} ORDER BY ORDINAL_POSITION",
            quote_literal(database),
            quote_literal(table)
        )
    }

    fn list_indexes_sql(&self, database: &str, _schema: Option<&str>, table: &str) -> String {
        format!(
            "SELECT DISTINCT INDEX_NAME AS name FROM INFORMATION_SCHEMA.STATISTICS \
             WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {}",
            quote_literal(database),
            quote_literal(table)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{IndexSpec, TableSchema};

    #[test]
    fn test_create_table_auto_increment() {
        let schema = TableSchema::new("user")
            .column(ColumnSpec::auto_pk("id"))
            .column(ColumnSpec::new("email", ColumnType::Varchar(255)).not_null());
        let sql = MysqlDialect::new().create_table_sql("user", &schema);
        assert_eq!(
            sql,
            "CREATE TABLE `user` (\
             `id` BIGINT AUTO_INCREMENT NOT NULL, \
             `email` VARCHAR(255) NOT NULL, \
             PRIMARY KEY (`id`))"
        );
    }

    #[test]
    fn test_drop_index_requires_table() {
        let sql = MysqlDialect::new().drop_index_sql("user", "IDX_user_email");
        assert_eq!(sql, "DROP INDEX `IDX_user_email` ON `user`");
    }

    #[test]
    fn test_modify_column() {
        let col = ColumnSpec::new("name", ColumnType::Varchar(500)).not_null();
        let sql = MysqlDialect::new().modify_column_sql("repository", &col).unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE `repository` MODIFY COLUMN `name` VARCHAR(500) NOT NULL"
        );
    }

    #[test]
    fn test_create_unique_index() {
        let idx = IndexSpec::unique(&["lower_name", "owner_id"]);
        let sql = MysqlDialect::new().create_index_sql("repository", &idx);
        assert_eq!(
            sql,
            "CREATE UNIQUE INDEX `UQE_repository_lower_name_owner_id` \
             ON `repository` (`lower_name`, `owner_id`)"
        );
    }
}
