//! Environment and engine bootstrap: connection resolution and whole-database
//! provisioning.
//!
//! Used by the test harness and the fresh-install path only; the migration
//! runner itself never drops or creates databases. Everything here runs on
//! its own administrative connections, outside any migration transaction,
//! because `CREATE DATABASE`/`DROP DATABASE` cannot run inside one.

use tracing::info;

use crate::config::DatabaseConfig;
use crate::dialect::DbType;
use crate::error::{MigrateError, Result};
use crate::session::Session;

/// Open a session for the configured database.
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn Session>> {
    config.validate()?;
    match config.db_type()? {
        #[cfg(feature = "sqlite")]
        DbType::Sqlite => Ok(Box::new(crate::drivers::SqliteSession::open(&config.path)?)),
        #[cfg(feature = "mysql")]
        DbType::Mysql => Ok(Box::new(
            crate::drivers::MysqlSession::connect(config).await?,
        )),
        #[cfg(feature = "postgres")]
        DbType::Postgres => Ok(Box::new(
            crate::drivers::PostgresSession::connect(config).await?,
        )),
        #[cfg(feature = "mssql")]
        DbType::Mssql => Ok(Box::new(
            crate::drivers::MssqlSession::connect(config).await?,
        )),
        #[allow(unreachable_patterns)]
        other => Err(MigrateError::config(format!(
            "support for {} is not compiled into this binary",
            other
        ))),
    }
}

/// Connect and run a trivial query.
pub async fn health_check(config: &DatabaseConfig) -> Result<()> {
    let mut sess = connect(config).await?;
    sess.query("SELECT 1").await?;
    Ok(())
}

/// Drop and recreate the configured database.
///
/// Destructive by design: every table and row in the database is lost.
pub async fn recreate_database(config: &DatabaseConfig) -> Result<()> {
    config.validate()?;
    info!("recreating database {}", display_name(config));

    match config.db_type()? {
        #[cfg(feature = "sqlite")]
        DbType::Sqlite => {
            let path = std::path::Path::new(&config.path);
            if path.exists() {
                std::fs::remove_file(path)?;
            }
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Ok(())
        }
        #[cfg(feature = "mysql")]
        DbType::Mysql => {
            use crate::core::identifier::quote_mysql;
            let mut admin = config.clone();
            admin.name = "mysql".to_string();
            let mut sess = crate::drivers::MysqlSession::connect(&admin).await?;
            sess.exec(&format!(
                "DROP DATABASE IF EXISTS {}",
                quote_mysql(&config.name)
            ))
            .await?;
            sess.exec(&format!(
                "CREATE DATABASE IF NOT EXISTS {}",
                quote_mysql(&config.name)
            ))
            .await?;
            Ok(())
        }
        #[cfg(feature = "postgres")]
        DbType::Postgres => {
            use crate::core::identifier::{quote_double, quote_literal};
            let mut admin = config.clone();
            admin.name = "postgres".to_string();
            admin.schema = String::new();
            let mut sess = crate::drivers::PostgresSession::connect(&admin).await?;
            sess.exec(&format!(
                "DROP DATABASE IF EXISTS {}",
                quote_double(&config.name)
            ))
            .await?;
            sess.exec(&format!("CREATE DATABASE {}", quote_double(&config.name)))
                .await?;
            drop(sess);

            // Provision the schema and make it the user's default search
            // path; this affects new connections.
            if let Some(schema) = config.schema_opt() {
                let mut target = config.clone();
                target.schema = String::new();
                let mut sess = crate::drivers::PostgresSession::connect(&target).await?;
                let present = sess
                    .query(&format!(
                        "SELECT 1 AS present FROM information_schema.schemata \
                         WHERE schema_name = {}",
                        quote_literal(schema)
                    ))
                    .await?;
                if present.is_empty() {
                    sess.exec(&format!("CREATE SCHEMA {}", quote_double(schema)))
                        .await?;
                }
                sess.exec(&format!(
                    "ALTER USER {} SET search_path = {}",
                    quote_double(&config.user),
                    quote_double(schema)
                ))
                .await?;
            }
            Ok(())
        }
        #[cfg(feature = "mssql")]
        DbType::Mssql => {
            use crate::core::identifier::quote_mssql;
            let mut admin = config.clone();
            admin.name = "master".to_string();
            let mut sess = crate::drivers::MssqlSession::connect(&admin).await?;
            sess.exec(&format!(
                "DROP DATABASE IF EXISTS {}",
                quote_mssql(&config.name)
            ))
            .await?;
            sess.exec(&format!("CREATE DATABASE {}", quote_mssql(&config.name)))
                .await?;
            Ok(())
        }
        #[allow(unreachable_patterns)]
        other => Err(MigrateError::config(format!(
            "support for {} is not compiled into this binary",
            other
        ))),
    }
}

fn display_name(config: &DatabaseConfig) -> &str {
    if config.name.is_empty() {
        &config.path
    } else {
        &config.name
    }
}
