//! SQLite session implementation backed by rusqlite.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::debug;

use crate::core::value::{Row, SqlValue};
use crate::dialect::DbType;
use crate::error::Result;
use crate::session::Session;

/// A session over a single SQLite connection.
pub struct SqliteSession {
    conn: Connection,
    database: String,
}

impl SqliteSession {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Ok(Self {
            conn,
            database: "main".to_string(),
        })
    }

    /// Open a fresh in-memory database (test harness).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            database: "main".to_string(),
        })
    }
}

#[async_trait]
impl Session for SqliteSession {
    fn db_type(&self) -> DbType {
        DbType::Sqlite
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    async fn exec(&mut self, sql: &str) -> Result<u64> {
        debug!("exec: {}", sql);
        let affected = self.conn.execute(sql, [])?;
        Ok(affected as u64)
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        debug!("query: {}", sql);
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut out = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut map = Row::new();
            for (i, name) in names.iter().enumerate() {
                let value = match row.get_ref(i)? {
                    ValueRef::Null => SqlValue::Null,
                    ValueRef::Integer(v) => SqlValue::Int(v),
                    ValueRef::Real(v) => SqlValue::Float(v),
                    ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
                    ValueRef::Blob(b) => SqlValue::Bytes(b.to_vec()),
                };
                map.insert(name.clone(), value);
            }
            out.push(map);
        }
        Ok(out)
    }

    async fn begin(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
