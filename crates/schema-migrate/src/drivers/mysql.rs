//! MySQL/MariaDB session implementation backed by SQLx.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow, MySqlSslMode};
use sqlx::{Column, ConnectOptions, Row as SqlxRow, ValueRef};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::core::value::{Row, SqlValue};
use crate::dialect::DbType;
use crate::error::Result;
use crate::session::Session;

/// A session over a single MySQL connection.
pub struct MysqlSession {
    conn: MySqlConnection,
    database: String,
}

impl MysqlSession {
    /// Connect using `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let ssl_mode = if config.ssl_mode == "require" {
            MySqlSslMode::Required
        } else {
            MySqlSslMode::Preferred
        };

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port_or_default())
            .database(&config.name)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(ssl_mode);

        let conn = options.connect().await?;

        info!(
            "Connected to MySQL: {}:{}/{}",
            config.host,
            config.port_or_default(),
            config.name
        );

        Ok(Self {
            conn,
            database: config.name.clone(),
        })
    }

    /// Convert one SQLx row into a column-name → value map.
    ///
    /// Decode attempts go from most to least specific; catalog queries only
    /// ever yield integers and strings, everything else falls back to text.
    fn row_to_map(row: &MySqlRow) -> Row {
        let mut map = Row::new();
        for (i, column) in row.columns().iter().enumerate() {
            let is_null = row
                .try_get_raw(i)
                .map(|v| v.is_null())
                .unwrap_or(true);
            let value = if is_null {
                SqlValue::Null
            } else if let Ok(v) = row.try_get::<i64, _>(i) {
                SqlValue::Int(v)
            } else if let Ok(v) = row.try_get::<u64, _>(i) {
                SqlValue::Int(v as i64)
            } else if let Ok(v) = row.try_get::<f64, _>(i) {
                SqlValue::Float(v)
            } else if let Ok(v) = row.try_get::<String, _>(i) {
                SqlValue::Text(v)
            } else if let Ok(v) = row.try_get::<Vec<u8>, _>(i) {
                SqlValue::Bytes(v)
            } else {
                SqlValue::Null
            };
            map.insert(column.name().to_string(), value);
        }
        map
    }
}

#[async_trait]
impl Session for MysqlSession {
    fn db_type(&self) -> DbType {
        DbType::Mysql
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    async fn exec(&mut self, sql: &str) -> Result<u64> {
        debug!("exec: {}", sql);
        let result = sqlx::query(sql).execute(&mut self.conn).await?;
        Ok(result.rows_affected())
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        debug!("query: {}", sql);
        let rows = sqlx::query(sql).fetch_all(&mut self.conn).await?;
        Ok(rows.iter().map(Self::row_to_map).collect())
    }

    async fn begin(&mut self) -> Result<()> {
        sqlx::query("START TRANSACTION")
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        sqlx::query("COMMIT").execute(&mut self.conn).await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        sqlx::query("ROLLBACK").execute(&mut self.conn).await?;
        Ok(())
    }
}
