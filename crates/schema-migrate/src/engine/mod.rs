//! The schema-change engine primitives.
//!
//! Four operations, each written against [`crate::session::Session`] and the
//! capability facts of the connected engine:
//!
//! - [`recreate_table`]: copy-and-swap rebuild to a full target schema
//! - [`drop_table_columns`]: physical column removal, emulated where the
//!   engine has no native support
//! - [`modify_column`]: in-place type/nullability change
//! - [`sync_table`]: additive create-if-missing / add-missing-columns
//!
//! None of these primitives manage transactions; the calling migration owns
//! the transaction and rolls the whole unit back on error.

mod drop_columns;
mod modify_column;
mod recreate;
pub mod sqlite_ddl;
mod sync;

pub use drop_columns::drop_table_columns;
pub use modify_column::modify_column;
pub use recreate::{recreate_table, TEMP_TABLE_PREFIX};
pub use sync::sync_table;
