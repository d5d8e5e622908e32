//! The database session abstraction the engine primitives run against.
//!
//! A [`Session`] is a single, exclusively-owned connection: the migration
//! runner executes strictly sequentially on one session, and every primitive
//! operates inside whatever transaction the caller has opened. No primitive
//! begins or ends a transaction on its own.
//!
//! Concrete implementations live in [`crate::drivers`], one per engine.

use async_trait::async_trait;

use crate::core::value::Row;
use crate::dialect::{DbType, DialectCaps, DialectImpl};
use crate::error::Result;

/// A live database connection with transaction control and introspection.
///
/// Transaction semantics follow the engine: MySQL and MSSQL auto-commit some
/// DDL mid-transaction, so callers must treat each unit of work as
/// at-least-once rather than strictly atomic (see the runner's re-run
/// contract).
#[async_trait]
pub trait Session: Send {
    /// The engine this session is connected to.
    fn db_type(&self) -> DbType;

    /// Name of the connected database (catalog). SQLite reports `main`.
    fn database_name(&self) -> &str;

    /// Schema/namespace within the database, when the engine has one
    /// configured (PostgreSQL).
    fn schema_name(&self) -> Option<&str> {
        None
    }

    /// Execute a statement, returning the affected row count where the
    /// driver reports one.
    async fn exec(&mut self, sql: &str) -> Result<u64>;

    /// Execute a query, returning all rows as column-name → value maps.
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>>;

    /// Open a transaction.
    async fn begin(&mut self) -> Result<()>;

    /// Commit the open transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction.
    async fn rollback(&mut self) -> Result<()>;

    /// The SQL syntax strategy for this session's engine.
    fn dialect(&self) -> DialectImpl {
        DialectImpl::for_db_type(self.db_type())
    }

    /// The capability facts for this session's engine.
    fn caps(&self) -> DialectCaps {
        self.db_type().caps()
    }
}
