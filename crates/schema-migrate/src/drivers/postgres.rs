//! PostgreSQL session implementation backed by tokio-postgres.
//!
//! Statements run through the simple-query protocol: the engine primitives
//! build complete SQL text (identifiers cannot be parameterized), and the
//! simple protocol keeps session-level statements like `BEGIN` working
//! as expected. Result values arrive as text and are coerced by the
//! [`SqlValue`] accessors.

use async_trait::async_trait;
use tokio_postgres::{Config as PgConfig, NoTls, SimpleQueryMessage};
use tracing::{debug, error, info};

use crate::config::DatabaseConfig;
use crate::core::identifier::quote_double;
use crate::core::value::{Row, SqlValue};
use crate::dialect::DbType;
use crate::error::Result;
use crate::session::Session;

/// A session over a single PostgreSQL connection.
pub struct PostgresSession {
    client: tokio_postgres::Client,
    database: String,
    schema: Option<String>,
}

impl PostgresSession {
    /// Connect using `config`, setting the search path when a schema is
    /// configured.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut pg = PgConfig::new();
        pg.host(&config.host)
            .port(config.port_or_default())
            .user(&config.user)
            .password(&config.password)
            .dbname(&config.name);

        let (client, connection) = pg.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("postgres connection error: {}", e);
            }
        });

        if let Some(schema) = config.schema_opt() {
            client
                .batch_execute(&format!("SET search_path = {}", quote_double(schema)))
                .await?;
        }

        info!(
            "Connected to PostgreSQL: {}:{}/{}",
            config.host,
            config.port_or_default(),
            config.name
        );

        Ok(Self {
            client,
            database: config.name.clone(),
            schema: config.schema_opt().map(str::to_string),
        })
    }
}

#[async_trait]
impl Session for PostgresSession {
    fn db_type(&self) -> DbType {
        DbType::Postgres
    }

    fn database_name(&self) -> &str {
        &self.database
    }

    fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    async fn exec(&mut self, sql: &str) -> Result<u64> {
        debug!("exec: {}", sql);
        let messages = self.client.simple_query(sql).await?;
        let mut affected = 0;
        for message in messages {
            if let SimpleQueryMessage::CommandComplete(n) = message {
                affected += n;
            }
        }
        Ok(affected)
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        debug!("query: {}", sql);
        let messages = self.client.simple_query(sql).await?;
        let mut out = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                let mut map = Row::new();
                for (i, column) in row.columns().iter().enumerate() {
                    let value = match row.get(i) {
                        Some(text) => SqlValue::Text(text.to_string()),
                        None => SqlValue::Null,
                    };
                    map.insert(column.name().to_string(), value);
                }
                out.push(map);
            }
        }
        Ok(out)
    }

    async fn begin(&mut self) -> Result<()> {
        self.client.batch_execute("BEGIN").await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.client.batch_execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.client.batch_execute("ROLLBACK").await?;
        Ok(())
    }
}
