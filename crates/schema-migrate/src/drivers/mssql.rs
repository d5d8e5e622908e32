//! MSSQL session implementation backed by Tiberius.
//!
//! Statements run as direct batches (`simple_query`), not through
//! `sp_executesql`: `SET IDENTITY_INSERT` applies at session scope only when
//! executed as a batch, and the rebuild engine depends on it staying in
//! effect across the data copy.

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, ColumnData, Config as TiberiusConfig, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::core::value::{Row, SqlValue};
use crate::dialect::DbType;
use crate::error::Result;
use crate::session::Session;

/// A session over a single MSSQL connection.
pub struct MssqlSession {
    client: Client<Compat<TcpStream>>,
    database: String,
}

impl MssqlSession {
    /// Connect using `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut tib = TiberiusConfig::new();
        tib.host(&config.host);
        tib.port(config.port_or_default());
        tib.database(&config.name);
        tib.authentication(AuthMethod::sql_server(&config.user, &config.password));
        if config.ssl_mode == "disable" {
            tib.encryption(EncryptionLevel::NotSupported);
        } else {
            if config.trust_server_cert {
                tib.trust_cert();
            }
            tib.encryption(EncryptionLevel::Required);
        }

        let tcp = TcpStream::connect(tib.get_addr()).await?;
        tcp.set_nodelay(true)?;
        let client = Client::connect(tib, tcp.compat_write()).await?;

        info!(
            "Connected to MSSQL: {}:{}/{}",
            config.host,
            config.port_or_default(),
            config.name
        );

        Ok(Self {
            client,
            database: config.name.clone(),
        })
    }

    fn column_data_to_value(data: ColumnData<'static>) -> SqlValue {
        match data {
            ColumnData::U8(v) => v.map(|x| SqlValue::Int(i64::from(x))).unwrap_or(SqlValue::Null),
            ColumnData::I16(v) => v.map(|x| SqlValue::Int(i64::from(x))).unwrap_or(SqlValue::Null),
            ColumnData::I32(v) => v.map(|x| SqlValue::Int(i64::from(x))).unwrap_or(SqlValue::Null),
            ColumnData::I64(v) => v.map(SqlValue::Int).unwrap_or(SqlValue::Null),
            ColumnData::F32(v) => v.map(|x| SqlValue::Float(f64::from(x))).unwrap_or(SqlValue::Null),
            ColumnData::F64(v) => v.map(SqlValue::Float).unwrap_or(SqlValue::Null),
            ColumnData::Bit(v) => v.map(SqlValue::Bool).unwrap_or(SqlValue::Null),
            ColumnData::String(v) => v
                .map(|s| SqlValue::Text(s.into_owned()))
                .unwrap_or(SqlValue::Null),
            ColumnData::Binary(v) => v
                .map(|b| SqlValue::Bytes(b.into_owned()))
                .unwrap_or(SqlValue::Null),
            // Date/time, GUID, numeric and XML values never appear in the
            // catalog queries the engine issues.
            _ => SqlValue::Null,
        }
    }
}

#[async_trait]
impl Session for MssqlSession {
    fn db_type(&self) -> DbType {
        DbType::Mssql
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    async fn exec(&mut self, sql: &str) -> Result<u64> {
        debug!("exec: {}", sql);
        let stream = self.client.simple_query(sql).await?;
        stream.into_results().await?;
        // The simple-query path does not report affected counts.
        Ok(0)
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        debug!("query: {}", sql);
        let results = self.client.simple_query(sql).await?.into_results().await?;
        let mut out = Vec::new();
        for rows in results {
            for row in rows {
                let names: Vec<String> = row
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect();
                let mut map = Row::new();
                for (name, data) in names.into_iter().zip(row.into_iter()) {
                    map.insert(name, Self::column_data_to_value(data));
                }
                out.push(map);
            }
        }
        Ok(out)
    }

    async fn begin(&mut self) -> Result<()> {
        self.client.simple_query("BEGIN TRANSACTION").await?.into_results().await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.client.simple_query("COMMIT").await?.into_results().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.client.simple_query("ROLLBACK").await?.into_results().await?;
        Ok(())
    }
}
