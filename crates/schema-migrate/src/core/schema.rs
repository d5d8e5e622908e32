//! Schema model: the target-state description consumed by the engines.
//!
//! A [`TableSchema`] is the *complete* desired state of a table. The rebuild
//! engine in particular requires every column to be present, including
//! unchanged ones; a partial description would silently drop data during the
//! copy-and-swap.

use serde::{Deserialize, Serialize};

use crate::core::identifier::validate_identifier;
use crate::error::{MigrateError, Result};

/// Engine-neutral column type, rendered to concrete SQL per dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Bool,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Varchar(u32),
    Text,
    Blob,
    Timestamp,
}

/// A single column in a target schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,

    /// Engine-neutral type.
    pub col_type: ColumnType,

    /// Whether the column allows NULL.
    pub nullable: bool,

    /// Default value expression (SQL text), if any.
    ///
    /// A non-empty default also drives the `COALESCE` substitution during a
    /// table rebuild: rows whose source value is NULL receive this default.
    pub default: Option<String>,

    /// Whether the column is (part of) the primary key.
    pub primary_key: bool,

    /// Whether the column is auto-incrementing (identity/serial).
    pub auto_increment: bool,
}

impl ColumnSpec {
    /// Create a nullable column with no default.
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
            nullable: true,
            default: None,
            primary_key: false,
            auto_increment: false,
        }
    }

    /// An auto-incrementing `BIGINT` primary key named `name`.
    pub fn auto_pk(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            col_type: ColumnType::BigInt,
            nullable: false,
            default: None,
            primary_key: true,
            auto_increment: true,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the default value expression.
    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Mark the column as (part of) the primary key.
    pub fn as_primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }
}

/// An index over one or more columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Indexed column names, in order.
    pub columns: Vec<String>,

    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexSpec {
    /// A non-unique index.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
        }
    }

    /// A unique index.
    pub fn unique(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: true,
        }
    }

    /// The index name when attached to `table`.
    ///
    /// Names embed the owning table (`IDX_<table>_<cols>` /
    /// `UQE_<table>_<cols>`). The rebuild engine relies on this: indexes
    /// created against the temporary table carry its name and are either
    /// dropped and recreated (SQLite/MySQL) or renamed back by stripping the
    /// temp prefix (PostgreSQL).
    pub fn name(&self, table: &str) -> String {
        let prefix = if self.unique { "UQE" } else { "IDX" };
        format!("{}_{}_{}", prefix, table, self.columns.join("_"))
    }
}

/// Complete desired state of a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,

    /// Every column of the table, in order.
    pub columns: Vec<ColumnSpec>,

    /// Secondary indexes (unique and non-unique).
    pub indexes: Vec<IndexSpec>,
}

impl TableSchema {
    /// Create an empty schema for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Append a column.
    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Append an index.
    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Primary key columns in declaration order.
    pub fn primary_key_columns(&self) -> Vec<&ColumnSpec> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    /// Whether the schema has a single auto-incrementing primary key.
    pub fn has_auto_increment_pk(&self) -> bool {
        self.columns
            .iter()
            .any(|c| c.primary_key && c.auto_increment)
    }

    /// Validate the schema before it drives DDL generation.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.name)?;
        if self.columns.is_empty() {
            return Err(MigrateError::schema("no columns in new table"));
        }
        for column in &self.columns {
            validate_identifier(&column.name)?;
        }
        for index in &self.indexes {
            if index.columns.is_empty() {
                return Err(MigrateError::schema(format!(
                    "index on table {} has no columns",
                    self.name
                )));
            }
            for col in &index.columns {
                if !self.columns.iter().any(|c| &c.name == col) {
                    return Err(MigrateError::schema(format!(
                        "index on table {} references unknown column {}",
                        self.name, col
                    )));
                }
            }
        }
        Ok(())
    }
}
