//! In-place column modification.

use tracing::{error, info};

use crate::core::identifier::quote_literal;
use crate::core::schema::ColumnSpec;
use crate::core::value::RowExt;
use crate::dialect::Dialect;
use crate::error::{MigrateError, Result};
use crate::session::Session;

/// An index captured before an MSSQL `ALTER COLUMN`, for recreation after.
#[derive(Debug)]
struct SavedIndex {
    name: String,
    unique: bool,
    columns: Vec<String>,
}

/// Change a single existing column's type/nullability in place.
///
/// On MSSQL every index on the table is dropped first - `ALTER COLUMN` fails
/// while any index references the column, even through a composite index -
/// and recreated afterwards. A failed recreation is logged and does not fail
/// the operation: the column change already succeeded and the missing index
/// is recoverable by an operator.
///
/// # Errors
///
/// `Unsupported` on SQLite, which has no native column modification; rebuild
/// the table instead.
pub async fn modify_column(sess: &mut dyn Session, table: &str, col: &ColumnSpec) -> Result<()> {
    let dialect = sess.dialect();
    let caps = sess.caps();

    info!("modifying column {} on table {}", col.name, table);

    let mut saved = Vec::new();
    if caps.needs_index_drop_before_alter {
        saved = collect_indexes(sess, table).await?;
        for index in &saved {
            sess.exec(&dialect.drop_index_sql(table, &index.name))
                .await
                .map_err(|e| MigrateError::statement(table, "drop index", e))?;
        }
    }

    let alter = dialect.modify_column_sql(table, col)?;
    let outcome = sess
        .exec(&alter)
        .await
        .map_err(|e| MigrateError::statement(table, "modify column", e));

    // Recreate the dropped indexes whether or not the alter succeeded,
    // mirroring the original's deferred recreation.
    for index in &saved {
        let columns: Vec<String> = index.columns.iter().map(|c| dialect.quote(c)).collect();
        let sql = format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            dialect.quote(&index.name),
            dialect.quote(table),
            columns.join(", ")
        );
        if let Err(e) = sess.exec(&sql).await {
            error!(
                "create index {} on table {} failed: {}",
                index.name, table, e
            );
        }
    }

    outcome.map(|_| ())
}

/// Enumerate the non-primary-key indexes of an MSSQL table with enough
/// metadata to recreate them.
async fn collect_indexes(sess: &mut dyn Session, table: &str) -> Result<Vec<SavedIndex>> {
    let rows = sess
        .query(&format!(
            "SELECT i.name AS index_name, i.is_unique AS is_unique, c.name AS column_name \
             FROM sys.indexes i \
             INNER JOIN sys.index_columns ic \
             ON i.object_id = ic.object_id AND i.index_id = ic.index_id \
             INNER JOIN sys.columns c \
             ON ic.object_id = c.object_id AND ic.column_id = c.column_id \
             WHERE i.object_id = OBJECT_ID({}) AND i.is_primary_key = 0 AND i.type > 0 \
             ORDER BY i.name, ic.key_ordinal",
            quote_literal(table)
        ))
        .await
        .map_err(|e| MigrateError::statement(table, "list indexes", e))?;

    let mut indexes: Vec<SavedIndex> = Vec::new();
    for row in rows {
        let (Some(name), Some(column)) = (row.get_str("index_name"), row.get_str("column_name"))
        else {
            continue;
        };
        let unique = row.get_bool("is_unique").unwrap_or(false);
        match indexes.last_mut() {
            Some(last) if last.name == name => last.columns.push(column.to_string()),
            _ => indexes.push(SavedIndex {
                name: name.to_string(),
                unique,
                columns: vec![column.to_string()],
            }),
        }
    }
    Ok(indexes)
}
