//! The persisted schema version record.
//!
//! A dedicated one-row system table (`id = 1`) holds the highest sequence
//! number successfully applied. Only the runner reads or writes it.

use crate::core::schema::{ColumnSpec, ColumnType, TableSchema};
use crate::core::value::RowExt;
use crate::dialect::Dialect;
use crate::engine::sync_table;
use crate::error::Result;
use crate::session::Session;

/// Default name of the version table.
pub const DEFAULT_VERSION_TABLE: &str = "schema_version";

/// Reads and writes the single version row.
#[derive(Debug, Clone)]
pub struct VersionStore {
    table: String,
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionStore {
    pub fn new() -> Self {
        Self {
            table: DEFAULT_VERSION_TABLE.to_string(),
        }
    }

    pub fn with_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    fn schema(&self) -> TableSchema {
        TableSchema::new(&self.table)
            .column(ColumnSpec::new("id", ColumnType::BigInt).as_primary_key())
            .column(ColumnSpec::new("version", ColumnType::BigInt).not_null())
    }

    /// Create the version table if it does not exist.
    pub async fn ensure(&self, sess: &mut dyn Session) -> Result<()> {
        sync_table(sess, &self.schema()).await
    }

    /// Read the recorded version. `None` means no row: a brand-new database.
    pub async fn get(&self, sess: &mut dyn Session) -> Result<Option<i64>> {
        let dialect = sess.dialect();
        let rows = sess
            .query(&format!(
                "SELECT version FROM {} WHERE id = 1",
                dialect.quote(&self.table)
            ))
            .await?;
        Ok(rows.first().and_then(|r| r.get_i64("version")))
    }

    /// Insert the initial version row at 0.
    pub async fn insert_initial(&self, sess: &mut dyn Session) -> Result<()> {
        let dialect = sess.dialect();
        sess.exec(&format!(
            "INSERT INTO {} (id, version) VALUES (1, 0)",
            dialect.quote(&self.table)
        ))
        .await?;
        Ok(())
    }

    /// Advance the recorded version.
    pub async fn set(&self, sess: &mut dyn Session, version: i64) -> Result<()> {
        let dialect = sess.dialect();
        sess.exec(&format!(
            "UPDATE {} SET version = {} WHERE id = 1",
            dialect.quote(&self.table),
            version
        ))
        .await?;
        Ok(())
    }
}
