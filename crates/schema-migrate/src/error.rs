//! Error types for the migration library.

use thiserror::Error;

/// Main error type for schema migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, unknown engine type).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structural error in a target schema (e.g. a schema with no columns).
    #[error("Schema error: {0}")]
    Schema(String),

    /// Operation not supported by the connected engine.
    #[error("{operation} is not supported on {dialect}")]
    Unsupported {
        operation: String,
        dialect: &'static str,
    },

    /// A DDL/DML statement failed, with context about what was being done.
    #[error("{operation} on table {table} failed: {source}")]
    Statement {
        table: String,
        operation: String,
        #[source]
        source: Box<MigrateError>,
    },

    /// A migration function failed; the surrounding transaction was rolled back.
    #[error("migration[{version}]: {name} failed: {source}")]
    Migration {
        version: i64,
        name: String,
        #[source]
        source: Box<MigrateError>,
    },

    /// The recorded schema version is newer than this binary's registry.
    #[error(
        "database schema version {current} is newer than the expected version {expected}; \
         refusing to run against a database from a newer release"
    )]
    VersionTooNew { current: i64, expected: i64 },

    /// The database has no version record (never migrated / fresh install).
    #[error("database has not been initialized")]
    NotInitialized,

    /// The recorded schema version does not match the registry's expectation.
    #[error("current database version {current} is not equal to the expected version {expected}; run the migration pass to update it")]
    VersionMismatch { current: i64, expected: i64 },

    /// SQLite driver error.
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// MySQL driver error.
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    Mysql(#[from] sqlx::Error),

    /// PostgreSQL driver error.
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// MSSQL driver error.
    #[cfg(feature = "mssql")]
    #[error("MSSQL error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    /// IO error (SQLite file handling, config loading).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MigrateError {
    /// Create a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        MigrateError::Config(message.into())
    }

    /// Create a Schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        MigrateError::Schema(message.into())
    }

    /// Create an Unsupported error for an operation the dialect cannot perform.
    pub fn unsupported(operation: impl Into<String>, dialect: &'static str) -> Self {
        MigrateError::Unsupported {
            operation: operation.into(),
            dialect,
        }
    }

    /// Wrap an error with table/operation context.
    pub fn statement(
        table: impl Into<String>,
        operation: impl Into<String>,
        source: MigrateError,
    ) -> Self {
        MigrateError::Statement {
            table: table.into(),
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Format the error with its full source chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_context_in_display() {
        let err = MigrateError::statement(
            "user",
            "drop column",
            MigrateError::schema("boom"),
        );
        let msg = err.to_string();
        assert!(msg.contains("user"));
        assert!(msg.contains("drop column"));
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let err = MigrateError::Migration {
            version: 7,
            name: "add widget table".to_string(),
            source: Box::new(MigrateError::schema("no columns in new table")),
        };
        let detailed = err.format_detailed();
        assert!(detailed.contains("migration[7]"));
        assert!(detailed.contains("Caused by"));
        assert!(detailed.contains("no columns in new table"));
    }
}
