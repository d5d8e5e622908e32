//! # schema-migrate
//!
//! Cross-dialect SQL schema migration engine.
//!
//! An embeddable library for replaying an ordered, append-only list of
//! schema-change functions against SQLite, MySQL, PostgreSQL or MSSQL,
//! including the destructive operations the engines do not uniformly
//! support natively:
//!
//! - **Table rebuild** ([`recreate_table`]): copy-and-swap a table into a
//!   full target schema, preserving data, indexes, uniques and
//!   (on PostgreSQL) sequences.
//! - **Column drop** ([`drop_table_columns`]): native `DROP COLUMN` where
//!   available, a parse-and-rewrite of the table DDL on SQLite.
//! - **Column modify** ([`modify_column`]): in-place type/nullability
//!   change, with the MSSQL drop-and-recreate-indexes dance.
//! - **Schema sync** ([`sync_table`]): additive create-if-missing /
//!   add-missing-columns.
//!
//! ## Example
//!
//! ```rust,no_run
//! use futures_util::future::BoxFuture;
//! use schema_migrate::{
//!     sync_table, ColumnSpec, ColumnType, Migration, Migrator, Result,
//!     Session, TableSchema,
//! };
//!
//! fn add_label_table(sess: &mut dyn Session) -> BoxFuture<'_, Result<()>> {
//!     Box::pin(async move {
//!         let schema = TableSchema::new("label")
//!             .column(ColumnSpec::auto_pk("id"))
//!             .column(ColumnSpec::new("name", ColumnType::Varchar(255)).not_null());
//!         sync_table(sess, &schema).await
//!     })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = schema_migrate::Config::load("config.yaml")?;
//!     let mut sess = schema_migrate::bootstrap::connect(&config.database).await?;
//!     let migrator = Migrator::new(vec![
//!         Migration::new(1, "add label table", add_label_table),
//!     ])?;
//!     migrator.run(sess.as_mut()).await
//! }
//! ```

pub mod bootstrap;
pub mod config;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod migrate;
pub mod session;

// Re-exports for convenient access
pub use crate::config::{Config, DatabaseConfig};
pub use crate::core::schema::{ColumnSpec, ColumnType, IndexSpec, TableSchema};
pub use crate::core::value::{Row, RowExt, SqlValue};
pub use crate::dialect::{DbType, Dialect, DialectCaps, DialectImpl};
pub use crate::engine::{
    drop_table_columns, modify_column, recreate_table, sync_table, TEMP_TABLE_PREFIX,
};
pub use crate::error::{MigrateError, Result};
pub use crate::migrate::{Migration, MigrationFn, Migrator, VersionStore};
pub use crate::session::Session;
