//! Core types shared by every component: the schema model, query result
//! values, and identifier handling.

pub mod identifier;
pub mod schema;
pub mod value;

pub use schema::{ColumnSpec, ColumnType, IndexSpec, TableSchema};
pub use value::{Row, RowExt, SqlValue};
