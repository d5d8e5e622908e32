//! Schema synchronization: create a table if missing, otherwise add any
//! missing columns and indexes.
//!
//! This is the additive counterpart to the destructive primitives: it never
//! drops or modifies anything that already exists. Individual migrations use
//! it to provision new tables and columns, and the runner uses it to
//! provision the version table.

use std::collections::HashSet;

use tracing::info;

use crate::core::schema::TableSchema;
use crate::core::value::RowExt;
use crate::dialect::Dialect;
use crate::error::{MigrateError, Result};
use crate::session::Session;

/// Bring `table` up to `schema`, additively.
///
/// Missing table: created with all columns and indexes. Existing table:
/// columns and indexes present in `schema` but absent in the database are
/// added; nothing is removed or altered.
pub async fn sync_table(sess: &mut dyn Session, schema: &TableSchema) -> Result<()> {
    schema.validate()?;

    let dialect = sess.dialect();
    let database = sess.database_name().to_string();
    let schema_ns = sess.schema_name().map(str::to_string);

    let exists = !sess
        .query(&dialect.table_exists_sql(&database, schema_ns.as_deref(), &schema.name))
        .await
        .map_err(|e| MigrateError::statement(&schema.name, "check table exists", e))?
        .is_empty();

    if !exists {
        info!("creating table {}", schema.name);
        sess.exec(&dialect.create_table_sql(&schema.name, schema))
            .await
            .map_err(|e| MigrateError::statement(&schema.name, "create table", e))?;
        for index in &schema.indexes {
            sess.exec(&dialect.create_index_sql(&schema.name, index))
                .await
                .map_err(|e| MigrateError::statement(&schema.name, "create index", e))?;
        }
        return Ok(());
    }

    let rows = sess
        .query(&dialect.list_columns_sql(&database, schema_ns.as_deref(), &schema.name))
        .await
        .map_err(|e| MigrateError::statement(&schema.name, "list columns", e))?;
    let existing: HashSet<String> = rows
        .iter()
        .filter_map(|r| r.get_str("name"))
        .map(str::to_lowercase)
        .collect();

    for col in &schema.columns {
        if !existing.contains(&col.name.to_lowercase()) {
            info!("adding column {} to table {}", col.name, schema.name);
            sess.exec(&dialect.add_column_sql(&schema.name, col))
                .await
                .map_err(|e| MigrateError::statement(&schema.name, "add column", e))?;
        }
    }

    let rows = sess
        .query(&dialect.list_indexes_sql(&database, schema_ns.as_deref(), &schema.name))
        .await
        .map_err(|e| MigrateError::statement(&schema.name, "list indexes", e))?;
    let existing: HashSet<String> = rows
        .iter()
        .filter_map(|r| r.get_str("name"))
        .map(str::to_lowercase)
        .collect();

    for index in &schema.indexes {
        let name = index.name(&schema.name);
        if !existing.contains(&name.to_lowercase()) {
            info!("adding index {} to table {}", name, schema.name);
            sess.exec(&dialect.create_index_sql(&schema.name, index))
                .await
                .map_err(|e| MigrateError::statement(&schema.name, "create index", e))?;
        }
    }

    Ok(())
}
