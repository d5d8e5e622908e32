//! Configuration loading and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dialect::DbType;
use crate::error::{MigrateError, Result};

/// Root configuration structure (YAML).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The database to migrate.
    pub database: DatabaseConfig,
}

impl Config {
    /// Load and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&text)?;
        config.database.validate()?;
        Ok(config)
    }
}

/// Connection settings for one database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Engine type: sqlite, mysql, postgres or mssql (aliases accepted).
    #[serde(rename = "type")]
    pub db_type: String,

    /// Server host (unused for SQLite).
    #[serde(default)]
    pub host: String,

    /// Server port; 0 selects the engine default.
    #[serde(default)]
    pub port: u16,

    /// Database name (catalog).
    #[serde(default)]
    pub name: String,

    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Database file path (SQLite only).
    #[serde(default)]
    pub path: String,

    /// Schema / namespace (PostgreSQL only).
    #[serde(default)]
    pub schema: String,

    /// TLS mode: disable or require.
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,

    /// Trust the server certificate without verification (MSSQL).
    #[serde(default)]
    pub trust_server_cert: bool,
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

impl DatabaseConfig {
    /// The parsed engine type.
    pub fn db_type(&self) -> Result<DbType> {
        DbType::parse(&self.db_type)
    }

    /// Configured port, or the engine's conventional default.
    pub fn port_or_default(&self) -> u16 {
        if self.port != 0 {
            return self.port;
        }
        match self.db_type().ok() {
            Some(DbType::Mysql) => 3306,
            Some(DbType::Postgres) => 5432,
            Some(DbType::Mssql) => 1433,
            _ => 0,
        }
    }

    /// PostgreSQL schema, when one is configured.
    pub fn schema_opt(&self) -> Option<&str> {
        if self.schema.is_empty() {
            None
        } else {
            Some(self.schema.as_str())
        }
    }

    /// Validate that the fields required by the engine type are present.
    pub fn validate(&self) -> Result<()> {
        let db_type = self.db_type()?;
        match db_type {
            DbType::Sqlite => {
                if self.path.is_empty() {
                    return Err(MigrateError::config(
                        "sqlite requires a database file path",
                    ));
                }
            }
            _ => {
                for (field, value) in
                    [("host", &self.host), ("name", &self.name), ("user", &self.user)]
                {
                    if value.is_empty() {
                        return Err(MigrateError::config(format!(
                            "{} requires a {}",
                            db_type, field
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_sqlite_config() {
        let config = parse(
            "database:\n  type: sqlite\n  path: /var/lib/app/app.db\n",
        );
        assert!(config.database.validate().is_ok());
        assert_eq!(config.database.db_type().unwrap(), DbType::Sqlite);
    }

    #[test]
    fn test_parse_postgres_config_with_defaults() {
        let config = parse(
            "database:\n  type: postgres\n  host: localhost\n  name: app\n  user: app\n  password: secret\n",
        );
        assert!(config.database.validate().is_ok());
        assert_eq!(config.database.port_or_default(), 5432);
        assert_eq!(config.database.schema_opt(), None);
    }

    #[test]
    fn test_unknown_engine_rejected() {
        let config = parse("database:\n  type: oracle\n");
        let err = config.database.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown database type"));
    }

    #[test]
    fn test_sqlite_requires_path() {
        let config = parse("database:\n  type: sqlite\n");
        assert!(config.database.validate().is_err());
    }

    #[test]
    fn test_server_engines_require_host() {
        let config = parse("database:\n  type: mysql\n  name: app\n  user: app\n");
        let err = config.database.validate().unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_password_not_serialized() {
        let config = parse(
            "database:\n  type: postgres\n  host: localhost\n  name: app\n  user: app\n  password: super_secret\n",
        );
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(
            !yaml.contains("super_secret"),
            "Password was serialized: {}",
            yaml
        );
    }
}
