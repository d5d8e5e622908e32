//! PostgreSQL integration tests.
//!
//! Gated on `SCHEMA_MIGRATE_TEST_PG_HOST`; skipped silently when no server
//! is configured. The configured database is dropped and recreated by each
//! test.

#![cfg(feature = "postgres")]

use schema_migrate::drivers::PostgresSession;
use schema_migrate::{
    bootstrap, drop_table_columns, recreate_table, sync_table, ColumnSpec, ColumnType,
    DatabaseConfig, IndexSpec, RowExt, Session, TableSchema,
};

fn config_from_env() -> Option<DatabaseConfig> {
    let host = std::env::var("SCHEMA_MIGRATE_TEST_PG_HOST").ok()?;
    Some(DatabaseConfig {
        db_type: "postgres".to_string(),
        host,
        port: std::env::var("SCHEMA_MIGRATE_TEST_PG_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(0),
        name: std::env::var("SCHEMA_MIGRATE_TEST_PG_DB")
            .unwrap_or_else(|_| "schema_migrate_test".to_string()),
        user: std::env::var("SCHEMA_MIGRATE_TEST_PG_USER")
            .unwrap_or_else(|_| "postgres".to_string()),
        password: std::env::var("SCHEMA_MIGRATE_TEST_PG_PASSWORD").unwrap_or_default(),
        path: String::new(),
        schema: String::new(),
        ssl_mode: "disable".to_string(),
        trust_server_cert: false,
    })
}

fn issue_schema() -> TableSchema {
    TableSchema::new("issue")
        .column(ColumnSpec::auto_pk("id"))
        .column(ColumnSpec::new("title", ColumnType::Varchar(255)).not_null())
        .column(
            ColumnSpec::new("num_comments", ColumnType::BigInt)
                .not_null()
                .with_default("0"),
        )
        .index(IndexSpec::unique(&["title"]))
}

#[tokio::test]
async fn postgres_recreate_preserves_sequence_continuity() {
    let Some(config) = config_from_env() else {
        eprintln!("skipping: SCHEMA_MIGRATE_TEST_PG_HOST not set");
        return;
    };
    bootstrap::recreate_database(&config).await.unwrap();
    let mut sess = PostgresSession::connect(&config).await.unwrap();

    sync_table(&mut sess, &issue_schema()).await.unwrap();
    for i in 1..=3 {
        sess.exec(&format!(
            "INSERT INTO \"issue\" (\"title\") VALUES ('issue {}')",
            i
        ))
        .await
        .unwrap();
    }

    sess.begin().await.unwrap();
    recreate_table(&mut sess, &issue_schema()).await.unwrap();
    sess.commit().await.unwrap();

    // The sequence continues from the highest transplanted id.
    sess.exec("INSERT INTO \"issue\" (\"title\") VALUES ('issue 4')")
        .await
        .unwrap();
    let rows = sess
        .query("SELECT id FROM \"issue\" WHERE title = 'issue 4'")
        .await
        .unwrap();
    assert_eq!(rows[0].get_i64("id"), Some(4));

    // Uniqueness survived the rebuild.
    assert!(sess
        .exec("INSERT INTO \"issue\" (\"title\") VALUES ('issue 1')")
        .await
        .is_err());
}

#[tokio::test]
async fn postgres_drop_columns_cascades_indexes() {
    let Some(mut config) = config_from_env() else {
        eprintln!("skipping: SCHEMA_MIGRATE_TEST_PG_HOST not set");
        return;
    };
    config.name.push_str("_drop");
    bootstrap::recreate_database(&config).await.unwrap();
    let mut sess = PostgresSession::connect(&config).await.unwrap();

    let schema = TableSchema::new("repo")
        .column(ColumnSpec::auto_pk("id"))
        .column(ColumnSpec::new("owner_name", ColumnType::Varchar(255)))
        .column(ColumnSpec::new("size", ColumnType::BigInt))
        .index(IndexSpec::new(&["owner_name"]));
    sync_table(&mut sess, &schema).await.unwrap();

    drop_table_columns(&mut sess, "repo", &["owner_name", "size"])
        .await
        .unwrap();

    let rows = sess
        .query(
            "SELECT column_name AS name FROM information_schema.columns \
             WHERE table_name = 'repo' ORDER BY ordinal_position",
        )
        .await
        .unwrap();
    let columns: Vec<&str> = rows.iter().filter_map(|r| r.get_str("name")).collect();
    assert_eq!(columns, vec!["id"]);
}
