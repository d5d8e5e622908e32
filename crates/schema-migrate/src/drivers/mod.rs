//! Database driver implementations of the [`crate::session::Session`] trait.
//!
//! One module per engine, each behind a feature flag (all enabled by
//! default):
//!
//! - [`sqlite`]: rusqlite
//! - [`mysql`]: SQLx
//! - [`postgres`]: tokio-postgres
//! - [`mssql`]: Tiberius
//!
//! Each driver owns exactly one connection; pooling is deliberately absent,
//! since the migration runner requires a single exclusively-owned session.

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mssql")]
pub use mssql::MssqlSession;
#[cfg(feature = "mysql")]
pub use mysql::MysqlSession;
#[cfg(feature = "postgres")]
pub use postgres::PostgresSession;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSession;
