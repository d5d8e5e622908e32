//! SQL dialect support: engine identification, capability facts, and
//! per-engine SQL generation strategies.
//!
//! # Architecture
//!
//! - [`DbType`] identifies one of the four supported engines.
//! - [`DialectCaps`] is a value object of static capability facts, resolved
//!   once from the engine type and passed explicitly to the engine
//!   primitives. No capability is ever read from global state.
//! - [`Dialect`] is the SQL syntax strategy (Strategy pattern); one
//!   implementation per engine under this module.
//! - [`DialectImpl`] provides zero-cost static dispatch over the four
//!   strategies - the compiler generates a match statement instead of using
//!   vtable dispatch.

mod mssql;
mod mysql;
mod postgres;
mod sqlite;

pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use serde::{Deserialize, Serialize};

use crate::core::schema::{ColumnSpec, IndexSpec, TableSchema};
use crate::error::{MigrateError, Result};

/// The four supported SQL engine families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Sqlite,
    Mysql,
    Postgres,
    Mssql,
}

impl DbType {
    /// Parse an engine type string, accepting common aliases.
    ///
    /// # Errors
    ///
    /// Returns a config error for unrecognized engine types. This is the
    /// library-level replacement for the original fatal-log-and-exit: the
    /// caller decides whether an unknown engine aborts the process.
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DbType::Sqlite),
            "mysql" | "mariadb" => Ok(DbType::Mysql),
            "postgres" | "postgresql" | "pg" => Ok(DbType::Postgres),
            "mssql" | "sqlserver" | "sql_server" => Ok(DbType::Mssql),
            other => Err(MigrateError::config(format!(
                "Unknown database type: '{}'. Supported types: sqlite, mysql, postgres, mssql",
                other
            ))),
        }
    }

    /// Canonical engine name.
    pub fn as_str(self) -> &'static str {
        match self {
            DbType::Sqlite => "sqlite",
            DbType::Mysql => "mysql",
            DbType::Postgres => "postgres",
            DbType::Mssql => "mssql",
        }
    }

    /// Resolve the static capability facts for this engine.
    pub fn caps(self) -> DialectCaps {
        DialectCaps::for_db_type(self)
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static knowledge of what each engine can and cannot do in place.
///
/// Resolved once per connection and passed explicitly; every dialect branch
/// in the engine primitives is driven by these facts rather than by
/// scattered predicates.
#[derive(Debug, Clone, Copy)]
pub struct DialectCaps {
    pub db_type: DbType,

    /// Native `ALTER TABLE ... DROP COLUMN` support. SQLite (in the supported
    /// version range) requires a full DDL rewrite instead.
    pub supports_drop_column: bool,

    /// Native in-place column type/nullability change. SQLite has none; a
    /// table rebuild is the only option there.
    pub supports_modify_column: bool,

    /// `DROP COLUMN ... CASCADE` removes dependent indexes/constraints
    /// (PostgreSQL); other engines need explicit index drops first.
    pub drop_column_cascades: bool,

    /// Explicit values cannot be written into an identity column without
    /// `SET IDENTITY_INSERT` (MSSQL), needed to preserve primary keys during
    /// a rebuild.
    pub needs_identity_insert: bool,

    /// `ALTER COLUMN` fails while any index references the column, even
    /// through a composite index (MSSQL).
    pub needs_index_drop_before_alter: bool,

    /// Renaming a table carries its constraints to the new name
    /// (MSSQL `sp_rename`); SQLite/MySQL drop-and-recreate instead.
    pub rename_moves_constraints: bool,

    /// Auto-increment columns are backed by named, introspectable sequences
    /// that must be preserved across a rebuild (PostgreSQL).
    pub has_sequences: bool,
}

impl DialectCaps {
    /// Capability facts for `db_type`.
    pub fn for_db_type(db_type: DbType) -> Self {
        match db_type {
            DbType::Sqlite => Self {
                db_type,
                supports_drop_column: false,
                supports_modify_column: false,
                drop_column_cascades: false,
                needs_identity_insert: false,
                needs_index_drop_before_alter: false,
                rename_moves_constraints: false,
                has_sequences: false,
            },
            DbType::Mysql => Self {
                db_type,
                supports_drop_column: true,
                supports_modify_column: true,
                drop_column_cascades: false,
                needs_identity_insert: false,
                needs_index_drop_before_alter: false,
                rename_moves_constraints: false,
                has_sequences: false,
            },
            DbType::Postgres => Self {
                db_type,
                supports_drop_column: true,
                supports_modify_column: true,
                drop_column_cascades: true,
                needs_identity_insert: false,
                needs_index_drop_before_alter: false,
                rename_moves_constraints: false,
                has_sequences: true,
            },
            DbType::Mssql => Self {
                db_type,
                supports_drop_column: true,
                supports_modify_column: true,
                drop_column_cascades: false,
                needs_identity_insert: true,
                needs_index_drop_before_alter: true,
                rename_moves_constraints: true,
                has_sequences: false,
            },
        }
    }
}

/// SQL syntax strategy for one engine.
///
/// Default implementations cover the syntax the engines share; each dialect
/// overrides only where its grammar genuinely differs.
pub trait Dialect: Send + Sync {
    /// The engine this strategy targets.
    fn db_type(&self) -> DbType;

    /// Quote an identifier (table name, column name, index name).
    fn quote(&self, name: &str) -> String;

    /// Render a column's type, given the full column definition
    /// (auto-increment columns render as serial types on PostgreSQL).
    fn column_type_sql(&self, col: &ColumnSpec) -> String;

    /// Clause appended to an auto-increment column definition
    /// (`AUTO_INCREMENT`, `IDENTITY(1,1)`, ...). Empty when the type itself
    /// carries the auto-increment semantics.
    fn auto_increment_clause(&self) -> &'static str {
        ""
    }

    /// Whether a single auto-increment primary key is declared inline on the
    /// column rather than as a table-level `PRIMARY KEY` clause. Required on
    /// SQLite (`INTEGER PRIMARY KEY AUTOINCREMENT`).
    fn inline_auto_pk(&self) -> bool {
        false
    }

    /// Keyword between `ADD` and the column definition (empty on MSSQL).
    fn add_column_keyword(&self) -> &'static str {
        "COLUMN "
    }

    /// Render one column definition.
    fn column_def_sql(&self, col: &ColumnSpec) -> String {
        let mut def = format!("{} {}", self.quote(&col.name), self.column_type_sql(col));
        if col.auto_increment {
            if self.inline_auto_pk() && col.primary_key {
                def.push_str(" PRIMARY KEY");
            }
            let clause = self.auto_increment_clause();
            if !clause.is_empty() {
                def.push(' ');
                def.push_str(clause);
            }
        }
        if !col.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &col.default {
            if !default.is_empty() {
                def.push_str(" DEFAULT ");
                def.push_str(default);
            }
        }
        def
    }

    /// Render the `CREATE TABLE` statement for `schema`, under `table_name`
    /// (which may differ from `schema.name` during a rebuild).
    fn create_table_sql(&self, table_name: &str, schema: &TableSchema) -> String {
        let mut defs: Vec<String> = schema
            .columns
            .iter()
            .map(|c| self.column_def_sql(c))
            .collect();

        let pk = schema.primary_key_columns();
        let pk_inline =
            pk.len() == 1 && pk[0].auto_increment && self.inline_auto_pk();
        if !pk.is_empty() && !pk_inline {
            let cols: Vec<String> = pk.iter().map(|c| self.quote(&c.name)).collect();
            defs.push(format!("PRIMARY KEY ({})", cols.join(", ")));
        }

        format!(
            "CREATE TABLE {} ({})",
            self.quote(table_name),
            defs.join(", ")
        )
    }

    /// Render `CREATE [UNIQUE] INDEX` for `index` attached to `table_name`.
    fn create_index_sql(&self, table_name: &str, index: &IndexSpec) -> String {
        let cols: Vec<String> = index.columns.iter().map(|c| self.quote(c)).collect();
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.quote(&index.name(table_name)),
            self.quote(table_name),
            cols.join(", ")
        )
    }

    /// Render `DROP INDEX` for `index_name` on `table_name`.
    fn drop_index_sql(&self, table_name: &str, index_name: &str) -> String {
        let _ = table_name;
        format!("DROP INDEX {}", self.quote(index_name))
    }

    /// Render a table rename.
    fn rename_table_sql(&self, from: &str, to: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote(from),
            self.quote(to)
        )
    }

    /// Render `DROP TABLE`.
    fn drop_table_sql(&self, table_name: &str) -> String {
        format!("DROP TABLE {}", self.quote(table_name))
    }

    /// Render `ALTER TABLE ... ADD COLUMN`.
    fn add_column_sql(&self, table_name: &str, col: &ColumnSpec) -> String {
        format!(
            "ALTER TABLE {} ADD {}{}",
            self.quote(table_name),
            self.add_column_keyword(),
            self.column_def_sql(col)
        )
    }

    /// Render the engine's in-place column modification statement.
    ///
    /// # Errors
    ///
    /// `Unsupported` on engines without native column modification (SQLite).
    fn modify_column_sql(&self, table_name: &str, col: &ColumnSpec) -> Result<String>;

    /// Query returning one row (any shape) when `table` exists.
    fn table_exists_sql(&self, database: &str, schema: Option<&str>, table: &str) -> String;

    /// Query returning the table's column names in a `name` column.
    fn list_columns_sql(&self, database: &str, schema: Option<&str>, table: &str) -> String;

    /// Query returning the table's index names in a `name` column.
    fn list_indexes_sql(&self, database: &str, schema: Option<&str>, table: &str) -> String;
}

/// Enum-based static dispatch over the four dialect strategies.
#[derive(Debug, Clone)]
pub enum DialectImpl {
    Sqlite(SqliteDialect),
    Mysql(MysqlDialect),
    Postgres(PostgresDialect),
    Mssql(MssqlDialect),
}

impl DialectImpl {
    /// The strategy for `db_type`.
    pub fn for_db_type(db_type: DbType) -> Self {
        match db_type {
            DbType::Sqlite => DialectImpl::Sqlite(SqliteDialect::new()),
            DbType::Mysql => DialectImpl::Mysql(MysqlDialect::new()),
            DbType::Postgres => DialectImpl::Postgres(PostgresDialect::new()),
            DbType::Mssql => DialectImpl::Mssql(MssqlDialect::new()),
        }
    }

    fn inner(&self) -> &dyn Dialect {
        match self {
            DialectImpl::Sqlite(d) => d,
            DialectImpl::Mysql(d) => d,
            DialectImpl::Postgres(d) => d,
            DialectImpl::Mssql(d) => d,
        }
    }
}

impl Dialect for DialectImpl {
    fn db_type(&self) -> DbType {
        self.inner().db_type()
    }

    fn quote(&self, name: &str) -> String {
        self.inner().quote(name)
    }

    fn column_type_sql(&self, col: &ColumnSpec) -> String {
        self.inner().column_type_sql(col)
    }

    fn auto_increment_clause(&self) -> &'static str {
        self.inner().auto_increment_clause()
    }

    fn inline_auto_pk(&self) -> bool {
        self.inner().inline_auto_pk()
    }

    fn add_column_keyword(&self) -> &'static str {
        self.inner().add_column_keyword()
    }

    fn column_def_sql(&self, col: &ColumnSpec) -> String {
        self.inner().column_def_sql(col)
    }

    fn create_table_sql(&self, table_name: &str, schema: &TableSchema) -> String {
        self.inner().create_table_sql(table_name, schema)
    }

    fn create_index_sql(&self, table_name: &str, index: &IndexSpec) -> String {
        self.inner().create_index_sql(table_name, index)
    }

    fn drop_index_sql(&self, table_name: &str, index_name: &str) -> String {
        self.inner().drop_index_sql(table_name, index_name)
    }

    fn rename_table_sql(&self, from: &str, to: &str) -> String {
        self.inner().rename_table_sql(from, to)
    }

    fn drop_table_sql(&self, table_name: &str) -> String {
        self.inner().drop_table_sql(table_name)
    }

    fn add_column_sql(&self, table_name: &str, col: &ColumnSpec) -> String {
        self.inner().add_column_sql(table_name, col)
    }

    fn modify_column_sql(&self, table_name: &str, col: &ColumnSpec) -> Result<String> {
        self.inner().modify_column_sql(table_name, col)
    }

    fn table_exists_sql(&self, database: &str, schema: Option<&str>, table: &str) -> String {
        self.inner().table_exists_sql(database, schema, table)
    }

    fn list_columns_sql(&self, database: &str, schema: Option<&str>, table: &str) -> String {
        self.inner().list_columns_sql(database, schema, table)
    }

    fn list_indexes_sql(&self, database: &str, schema: Option<&str>, table: &str) -> String {
        self.inner().list_indexes_sql(database, schema, table)
    }
}
