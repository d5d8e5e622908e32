//! Cross-dialect column removal.

use std::collections::HashSet;

use tracing::info;

use crate::core::identifier::quote_literal;
use crate::core::value::RowExt;
use crate::dialect::{DbType, Dialect, DialectImpl};
use crate::error::{MigrateError, Result};
use crate::session::Session;

use super::sqlite_ddl;

/// Physically remove `columns` (and their data) from `table`.
///
/// No-op when `table` or `columns` is empty. The caller owns the
/// transaction; any SQL error aborts immediately and propagates.
///
/// Per-engine behavior:
/// - PostgreSQL: one `ALTER TABLE` with `DROP COLUMN ... CASCADE` per column;
///   CASCADE removes dependent indexes and constraints.
/// - MySQL: indexes referencing a target column are discovered via
///   `SHOW INDEX` and dropped first, then one combined `ALTER TABLE`.
/// - MSSQL: default constraints bound to the columns, then indexes
///   referencing them, are discovered through the `sys` catalog and dropped
///   before the `ALTER TABLE`.
/// - SQLite: no native `DROP COLUMN` - the table's `CREATE TABLE` DDL is
///   rewritten without the columns and the data is copied into a
///   replacement table (see [`sqlite_ddl`]).
pub async fn drop_table_columns(
    sess: &mut dyn Session,
    table: &str,
    columns: &[&str],
) -> Result<()> {
    if table.is_empty() || columns.is_empty() {
        return Ok(());
    }

    let dialect = sess.dialect();
    info!("dropping columns {:?} from table {}", columns, table);

    match sess.db_type() {
        DbType::Sqlite => sqlite_drop(sess, &dialect, table, columns).await,
        DbType::Postgres => {
            let actions: Vec<String> = columns
                .iter()
                .map(|c| format!("DROP COLUMN {} CASCADE", dialect.quote(c)))
                .collect();
            sess.exec(&format!(
                "ALTER TABLE {} {}",
                dialect.quote(table),
                actions.join(", ")
            ))
            .await
            .map_err(|e| MigrateError::statement(table, "drop columns", e))?;
            Ok(())
        }
        DbType::Mysql => mysql_drop(sess, &dialect, table, columns).await,
        DbType::Mssql => mssql_drop(sess, &dialect, table, columns).await,
    }
}

async fn mysql_drop(
    sess: &mut dyn Session,
    dialect: &DialectImpl,
    table: &str,
    columns: &[&str],
) -> Result<()> {
    let in_list: Vec<String> = columns.iter().map(|c| quote_literal(c)).collect();
    let rows = sess
        .query(&format!(
            "SHOW INDEX FROM {} WHERE column_name IN ({})",
            dialect.quote(table),
            in_list.join(", ")
        ))
        .await
        .map_err(|e| MigrateError::statement(table, "list indexes", e))?;

    let mut dropped = HashSet::new();
    for row in rows {
        let Some(index) = row.get_str("Key_name") else {
            continue;
        };
        if index == "PRIMARY" || !dropped.insert(index.to_string()) {
            continue;
        }
        sess.exec(&dialect.drop_index_sql(table, index))
            .await
            .map_err(|e| MigrateError::statement(table, "drop index", e))?;
    }

    let actions: Vec<String> = columns
        .iter()
        .map(|c| format!("DROP COLUMN {}", dialect.quote(c)))
        .collect();
    sess.exec(&format!(
        "ALTER TABLE {} {}",
        dialect.quote(table),
        actions.join(", ")
    ))
    .await
    .map_err(|e| MigrateError::statement(table, "drop columns", e))?;
    Ok(())
}

async fn mssql_drop(
    sess: &mut dyn Session,
    dialect: &DialectImpl,
    table: &str,
    columns: &[&str],
) -> Result<()> {
    let table_lit = quote_literal(table);
    let in_list: Vec<String> = columns
        .iter()
        .map(|c| quote_literal(&c.to_lowercase()))
        .collect();
    let in_list = in_list.join(", ");

    // Default constraints bound to the columns block DROP COLUMN.
    let rows = sess
        .query(&format!(
            "SELECT dc.name AS name FROM sys.default_constraints dc \
             WHERE dc.parent_object_id = OBJECT_ID({table_lit}) \
             AND dc.parent_column_id IN (SELECT column_id FROM sys.columns \
             WHERE LOWER(name) IN ({in_list}) AND object_id = OBJECT_ID({table_lit}))"
        ))
        .await
        .map_err(|e| MigrateError::statement(table, "list default constraints", e))?;
    for row in rows {
        let Some(constraint) = row.get_str("name") else {
            continue;
        };
        sess.exec(&format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            dialect.quote(table),
            dialect.quote(constraint)
        ))
        .await
        .map_err(|e| MigrateError::statement(table, "drop default constraint", e))?;
    }

    // So do indexes referencing them, even through composite indexes.
    let rows = sess
        .query(&format!(
            "SELECT DISTINCT i.name AS name FROM sys.indexes i \
             INNER JOIN sys.index_columns ic \
             ON i.index_id = ic.index_id AND i.object_id = ic.object_id \
             WHERE i.object_id = OBJECT_ID({table_lit}) \
             AND ic.column_id IN (SELECT column_id FROM sys.columns \
             WHERE LOWER(name) IN ({in_list}) AND object_id = OBJECT_ID({table_lit}))"
        ))
        .await
        .map_err(|e| MigrateError::statement(table, "list indexes", e))?;
    for row in rows {
        let Some(index) = row.get_str("name") else {
            continue;
        };
        sess.exec(&dialect.drop_index_sql(table, index))
            .await
            .map_err(|e| MigrateError::statement(table, "drop index", e))?;
    }

    let actions: Vec<String> = columns
        .iter()
        .map(|c| dialect.quote(&c.to_lowercase()))
        .collect();
    sess.exec(&format!(
        "ALTER TABLE {} DROP COLUMN {}",
        dialect.quote(table),
        actions.join(", ")
    ))
    .await
    .map_err(|e| MigrateError::statement(table, "drop columns", e))?;
    Ok(())
}

async fn sqlite_drop(
    sess: &mut dyn Session,
    dialect: &DialectImpl,
    table: &str,
    columns: &[&str],
) -> Result<()> {
    let database = sess.database_name().to_string();

    // Walk the table's indexes: single-column indexes on a target column are
    // dropped, the rest have their DDL captured so they can be restored
    // after the swap (dropping the old table takes every index with it).
    // Multi-column indexes that include a dropped column are not restored -
    // they cannot exist without the column.
    let mut surviving_index_ddl: Vec<String> = Vec::new();
    let indexes = sess
        .query(&dialect.list_indexes_sql(&database, None, table))
        .await
        .map_err(|e| MigrateError::statement(table, "list indexes", e))?;
    for row in indexes {
        let Some(index) = row.get_str("name").map(str::to_string) else {
            continue;
        };
        let info = sess
            .query(&format!(
                "SELECT name FROM pragma_index_info({})",
                quote_literal(&index)
            ))
            .await
            .map_err(|e| MigrateError::statement(&index, "read index info", e))?;

        let references_dropped = info.iter().any(|r| {
            r.get_str("name")
                .map(|col| columns.iter().any(|c| c.eq_ignore_ascii_case(col)))
                .unwrap_or(false)
        });

        if info.len() == 1 && references_dropped {
            sess.exec(&format!("DROP INDEX {}", dialect.quote(&index)))
                .await
                .map_err(|e| MigrateError::statement(&index, "drop index", e))?;
            continue;
        }

        if !references_dropped {
            let ddl = sess
                .query(&format!(
                    "SELECT sql FROM sqlite_master \
                     WHERE type='index' AND name={} AND sql IS NOT NULL",
                    quote_literal(&index)
                ))
                .await
                .map_err(|e| MigrateError::statement(&index, "read index definition", e))?;
            if let Some(sql) = ddl.first().and_then(|r| r.get_str("sql")) {
                surviving_index_ddl.push(sql.to_string());
            }
        }
    }

    // Rewrite the literal CREATE TABLE without the columns.
    let rows = sess
        .query(&format!(
            "SELECT sql FROM sqlite_master WHERE tbl_name={} AND type='table'",
            quote_literal(table)
        ))
        .await
        .map_err(|e| MigrateError::statement(table, "read table definition", e))?;
    let table_sql = rows
        .first()
        .and_then(|r| r.get_str("sql"))
        .ok_or_else(|| {
            MigrateError::schema(format!("table {} not found in sqlite_master", table))
        })?
        .to_string();

    let rewritten = sqlite_ddl::strip_columns(&table_sql, columns)?;

    let replacement = format!("new_{}_new", table);
    sess.exec(&format!(
        "CREATE TABLE {} {}",
        dialect.quote(&replacement),
        rewritten.body
    ))
    .await
    .map_err(|e| MigrateError::statement(&replacement, "create replacement table", e))?;

    let survivors: Vec<String> = rewritten
        .columns
        .iter()
        .map(|c| dialect.quote(c))
        .collect();
    let survivors = survivors.join(", ");
    sess.exec(&format!(
        "INSERT INTO {} ({}) SELECT {} FROM {}",
        dialect.quote(&replacement),
        survivors,
        survivors,
        dialect.quote(table)
    ))
    .await
    .map_err(|e| MigrateError::statement(&replacement, "copy surviving columns", e))?;

    sess.exec(&dialect.drop_table_sql(table))
        .await
        .map_err(|e| MigrateError::statement(table, "drop old table", e))?;
    sess.exec(&dialect.rename_table_sql(&replacement, table))
        .await
        .map_err(|e| MigrateError::statement(table, "rename replacement table", e))?;

    for ddl in &surviving_index_ddl {
        sess.exec(ddl)
            .await
            .map_err(|e| MigrateError::statement(table, "restore index", e))?;
    }

    Ok(())
}
