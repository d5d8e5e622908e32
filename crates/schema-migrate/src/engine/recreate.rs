//! Table rebuild: copy-and-swap a table into a new schema.

use std::collections::HashMap;

use tracing::info;

use crate::core::identifier::quote_literal;
use crate::core::schema::TableSchema;
use crate::core::value::RowExt;
use crate::dialect::{DbType, Dialect, DialectImpl};
use crate::error::{MigrateError, Result};
use crate::session::Session;

/// Prefix of the temporary table a rebuild works through.
///
/// A table with this prefix at startup is the residue of an aborted rebuild
/// and requires manual intervention; rebuilds are never auto-resumed.
pub const TEMP_TABLE_PREFIX: &str = "tmp_recreate__";

/// Rebuild a live table so that it matches `schema`, transplanting all data.
///
/// `schema` must be the *complete* desired state, every column included -
/// a partial schema silently drops data, since only the listed columns are
/// copied. Rows whose source value is NULL in a column with a default are
/// coalesced to that default during the copy, which is how
/// nullable-to-non-null transitions are populated in one pass.
///
/// The caller owns the transaction: this function never commits or rolls
/// back, and any error propagates with the schema state left to the caller's
/// rollback.
pub async fn recreate_table(sess: &mut dyn Session, schema: &TableSchema) -> Result<()> {
    schema.validate()?;

    let dialect = sess.dialect();
    let caps = sess.caps();
    let table = schema.name.clone();
    let temp = format!("{}{}", TEMP_TABLE_PREFIX, table);

    info!("recreating table {} through {}", table, temp);

    sess.exec(&dialect.create_table_sql(&temp, schema))
        .await
        .map_err(|e| MigrateError::statement(&temp, "create temp table", e))?;
    for index in ordered_indexes(schema) {
        sess.exec(&dialect.create_index_sql(&temp, index))
            .await
            .map_err(|e| MigrateError::statement(&temp, "create temp index", e))?;
    }

    let identity_insert = schema.has_auto_increment_pk() && caps.needs_identity_insert;
    if identity_insert {
        sess.exec(&format!("SET IDENTITY_INSERT {} ON", dialect.quote(&temp)))
            .await
            .map_err(|e| MigrateError::statement(&temp, "enable identity insert", e))?;
    }

    sess.exec(&copy_sql(&dialect, &table, &temp, schema))
        .await
        .map_err(|e| MigrateError::statement(&temp, "copy data into temp table", e))?;

    if identity_insert {
        sess.exec(&format!("SET IDENTITY_INSERT {} OFF", dialect.quote(&temp)))
            .await
            .map_err(|e| MigrateError::statement(&temp, "disable identity insert", e))?;
    }

    match sess.db_type() {
        // Dropping the old table takes its constraints with it; the temp
        // table's own indexes would collide by name after the rename, so
        // they are dropped and recreated against the final name.
        DbType::Sqlite | DbType::Mysql => {
            sess.exec(&dialect.drop_table_sql(&table))
                .await
                .map_err(|e| MigrateError::statement(&table, "drop old table", e))?;
            for index in &schema.indexes {
                sess.exec(&dialect.drop_index_sql(&temp, &index.name(&temp)))
                    .await
                    .map_err(|e| MigrateError::statement(&temp, "drop temp index", e))?;
            }
            sess.exec(&dialect.rename_table_sql(&temp, &table))
                .await
                .map_err(|e| MigrateError::statement(&table, "rename temp table", e))?;
            for index in ordered_indexes(schema) {
                sess.exec(&dialect.create_index_sql(&table, index))
                    .await
                    .map_err(|e| MigrateError::statement(&table, "recreate index", e))?;
            }
        }
        DbType::Postgres => postgres_swap(sess, &dialect, &table, &temp).await?,
        // sp_rename moves the constraints across, so the swap is two
        // statements.
        DbType::Mssql => {
            sess.exec(&dialect.drop_table_sql(&table))
                .await
                .map_err(|e| MigrateError::statement(&table, "drop old table", e))?;
            sess.exec(&dialect.rename_table_sql(&temp, &table))
                .await
                .map_err(|e| MigrateError::statement(&table, "rename temp table", e))?;
        }
    }

    Ok(())
}

/// Unique indexes first, then the rest.
fn ordered_indexes(schema: &TableSchema) -> impl Iterator<Item = &crate::core::schema::IndexSpec> {
    schema
        .indexes
        .iter()
        .filter(|i| i.unique)
        .chain(schema.indexes.iter().filter(|i| !i.unique))
}

/// `INSERT INTO temp (cols) SELECT COALESCE(col, default)... FROM table`.
fn copy_sql(dialect: &DialectImpl, table: &str, temp: &str, schema: &TableSchema) -> String {
    let cols: Vec<String> = schema
        .columns
        .iter()
        .map(|c| dialect.quote(&c.name))
        .collect();
    let select: Vec<String> = schema
        .columns
        .iter()
        .map(|c| match &c.default {
            Some(default) if !default.is_empty() => {
                format!("COALESCE({}, {})", dialect.quote(&c.name), default)
            }
            _ => dialect.quote(&c.name),
        })
        .collect();
    format!(
        "INSERT INTO {} ({}) SELECT {} FROM {}",
        dialect.quote(temp),
        cols.join(", "),
        select.join(", "),
        dialect.quote(table)
    )
}

/// PostgreSQL swap: sequences backing serial columns must survive the
/// rebuild, so their state is snapshotted before the drop and restored after
/// the rename, and the physically `tmp_recreate__`-named indexes and
/// sequences are renamed back to their canonical names.
async fn postgres_swap(
    sess: &mut dyn Session,
    dialect: &DialectImpl,
    table: &str,
    temp: &str,
) -> Result<()> {
    let database = sess.database_name().to_string();
    let schema_ns = sess.schema_name().map(str::to_string);

    let mut sequence_state: HashMap<String, (i64, bool)> = HashMap::new();
    let rows = sess
        .query(&format!(
            "SELECT sequence_name AS name FROM information_schema.sequences \
             WHERE sequence_name LIKE {} AND sequence_catalog = {}",
            quote_literal(&format!("{}_%", table)),
            quote_literal(&database)
        ))
        .await
        .map_err(|e| MigrateError::statement(table, "list sequences", e))?;
    for row in rows {
        let Some(sequence) = row.get_str("name").map(str::to_string) else {
            continue;
        };
        let state = sess
            .query(&format!(
                "SELECT last_value, is_called FROM {}",
                dialect.quote(&sequence)
            ))
            .await
            .map_err(|e| MigrateError::statement(&sequence, "read sequence state", e))?;
        if let Some(first) = state.first() {
            if let (Some(last_value), Some(is_called)) =
                (first.get_i64("last_value"), first.get_bool("is_called"))
            {
                sequence_state.insert(sequence, (last_value, is_called));
            }
        }
    }

    sess.exec(&dialect.drop_table_sql(table))
        .await
        .map_err(|e| MigrateError::statement(table, "drop old table", e))?;
    sess.exec(&dialect.rename_table_sql(temp, table))
        .await
        .map_err(|e| MigrateError::statement(table, "rename temp table", e))?;

    let rows = sess
        .query(&dialect.list_indexes_sql(&database, schema_ns.as_deref(), table))
        .await
        .map_err(|e| MigrateError::statement(table, "list indexes", e))?;
    for row in rows {
        let Some(index) = row.get_str("name") else {
            continue;
        };
        // Index names carry the temp marker wherever the table name appears
        // (`IDX_tmp_recreate__star_owner_id`, `tmp_recreate__star_pkey`).
        let canonical = index.replacen(TEMP_TABLE_PREFIX, "", 1);
        if canonical != index {
            sess.exec(&format!(
                "ALTER INDEX {} RENAME TO {}",
                dialect.quote(index),
                dialect.quote(&canonical)
            ))
            .await
            .map_err(|e| MigrateError::statement(index, "rename index", e))?;
        }
    }

    let rows = sess
        .query(&format!(
            "SELECT sequence_name AS name FROM information_schema.sequences \
             WHERE sequence_name LIKE {} AND sequence_catalog = {}",
            quote_literal(&format!("{}{}_%", TEMP_TABLE_PREFIX, table)),
            quote_literal(&database)
        ))
        .await
        .map_err(|e| MigrateError::statement(table, "list temp sequences", e))?;
    for row in rows {
        let Some(sequence) = row.get_str("name").map(str::to_string) else {
            continue;
        };
        let canonical = sequence.replacen(TEMP_TABLE_PREFIX, "", 1);
        if canonical == sequence {
            continue;
        }
        sess.exec(&format!(
            "ALTER SEQUENCE {} RENAME TO {}",
            dialect.quote(&sequence),
            dialect.quote(&canonical)
        ))
        .await
        .map_err(|e| MigrateError::statement(&sequence, "rename sequence", e))?;

        let snapshot = sequence_state.get(&canonical);
        if canonical == format!("{}_id_seq", table) {
            match snapshot {
                Some((last_value, is_called)) if *last_value != 0 => {
                    sess.exec(&format!(
                        "SELECT setval('{}', {}, {})",
                        canonical, last_value, is_called
                    ))
                    .await
                    .map_err(|e| MigrateError::statement(&canonical, "reset sequence", e))?;
                }
                // No snapshot to restore - derive the next value from the
                // data that just landed in the table.
                _ => {
                    sess.exec(&format!(
                        "SELECT setval('{}', COALESCE((SELECT MAX(id)+1 FROM {}), 1), false)",
                        canonical,
                        dialect.quote(table)
                    ))
                    .await
                    .map_err(|e| MigrateError::statement(&canonical, "reset sequence", e))?;
                }
            }
        } else if let Some((last_value, is_called)) = snapshot {
            sess.exec(&format!(
                "SELECT setval('{}', {}, {})",
                canonical, last_value, is_called
            ))
            .await
            .map_err(|e| MigrateError::statement(&canonical, "reset sequence", e))?;
        }
    }

    Ok(())
}
