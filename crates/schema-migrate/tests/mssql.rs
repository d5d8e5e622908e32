//! MSSQL integration tests.
//!
//! Gated on `SCHEMA_MIGRATE_TEST_MSSQL_HOST`; skipped silently when no
//! server is configured.

#![cfg(feature = "mssql")]

use schema_migrate::drivers::MssqlSession;
use schema_migrate::{
    bootstrap, drop_table_columns, modify_column, recreate_table, sync_table, ColumnSpec,
    ColumnType, DatabaseConfig, IndexSpec, RowExt, Session, TableSchema,
};

fn config_from_env() -> Option<DatabaseConfig> {
    let host = std::env::var("SCHEMA_MIGRATE_TEST_MSSQL_HOST").ok()?;
    Some(DatabaseConfig {
        db_type: "mssql".to_string(),
        host,
        port: std::env::var("SCHEMA_MIGRATE_TEST_MSSQL_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(0),
        name: std::env::var("SCHEMA_MIGRATE_TEST_MSSQL_DB")
            .unwrap_or_else(|_| "schema_migrate_test".to_string()),
        user: std::env::var("SCHEMA_MIGRATE_TEST_MSSQL_USER")
            .unwrap_or_else(|_| "sa".to_string()),
        password: std::env::var("SCHEMA_MIGRATE_TEST_MSSQL_PASSWORD").unwrap_or_default(),
        path: String::new(),
        schema: String::new(),
        ssl_mode: "disable".to_string(),
        trust_server_cert: true,
    })
}

async fn column_names(sess: &mut MssqlSession, table: &str) -> Vec<String> {
    sess.query(&format!(
        "SELECT c.name AS name FROM sys.columns c \
         WHERE c.object_id = OBJECT_ID('{}') ORDER BY c.column_id",
        table
    ))
    .await
    .unwrap()
    .iter()
    .filter_map(|r| r.get_str("name").map(str::to_string))
    .collect()
}

async fn index_names(sess: &mut MssqlSession, table: &str) -> Vec<String> {
    sess.query(&format!(
        "SELECT name FROM sys.indexes \
         WHERE object_id = OBJECT_ID('{}') AND name IS NOT NULL AND is_primary_key = 0",
        table
    ))
    .await
    .unwrap()
    .iter()
    .filter_map(|r| r.get_str("name").map(str::to_string))
    .collect()
}

#[tokio::test]
async fn mssql_drop_columns_removes_defaults_and_indexes_first() {
    let Some(config) = config_from_env() else {
        eprintln!("skipping: SCHEMA_MIGRATE_TEST_MSSQL_HOST not set");
        return;
    };
    bootstrap::recreate_database(&config).await.unwrap();
    let mut sess = MssqlSession::connect(&config).await.unwrap();

    let schema = TableSchema::new("access_token")
        .column(ColumnSpec::auto_pk("id"))
        .column(
            ColumnSpec::new("scope", ColumnType::Varchar(255))
                .not_null()
                .with_default("''"),
        )
        .column(ColumnSpec::new("token_hash", ColumnType::Varchar(255)))
        .index(IndexSpec::new(&["scope"]));
    sync_table(&mut sess, &schema).await.unwrap();

    // Both the default constraint and the index on `scope` must be removed
    // before the column can go.
    drop_table_columns(&mut sess, "access_token", &["scope"])
        .await
        .unwrap();

    assert_eq!(
        column_names(&mut sess, "access_token").await,
        vec!["id", "token_hash"]
    );
}

#[tokio::test]
async fn mssql_modify_column_recreates_indexes() {
    let Some(mut config) = config_from_env() else {
        eprintln!("skipping: SCHEMA_MIGRATE_TEST_MSSQL_HOST not set");
        return;
    };
    config.name.push_str("_modify");
    bootstrap::recreate_database(&config).await.unwrap();
    let mut sess = MssqlSession::connect(&config).await.unwrap();

    let schema = TableSchema::new("hook_task")
        .column(ColumnSpec::auto_pk("id"))
        .column(ColumnSpec::new("payload", ColumnType::Varchar(255)))
        .column(ColumnSpec::new("uuid", ColumnType::Varchar(40)))
        .index(IndexSpec::unique(&["uuid"]))
        .index(IndexSpec::new(&["payload", "uuid"]));
    sync_table(&mut sess, &schema).await.unwrap();

    let before = index_names(&mut sess, "hook_task").await;

    // Widening `uuid` requires dropping and recreating every index,
    // including the composite one that merely includes it.
    let wider = ColumnSpec::new("uuid", ColumnType::Varchar(128));
    modify_column(&mut sess, "hook_task", &wider).await.unwrap();

    let mut after = index_names(&mut sess, "hook_task").await;
    let mut expected = before;
    expected.sort();
    after.sort();
    assert_eq!(after, expected);
}

#[tokio::test]
async fn mssql_recreate_preserves_identity_values() {
    let Some(mut config) = config_from_env() else {
        eprintln!("skipping: SCHEMA_MIGRATE_TEST_MSSQL_HOST not set");
        return;
    };
    config.name.push_str("_rebuild");
    bootstrap::recreate_database(&config).await.unwrap();
    let mut sess = MssqlSession::connect(&config).await.unwrap();

    let schema = TableSchema::new("deploy_key")
        .column(ColumnSpec::auto_pk("id"))
        .column(ColumnSpec::new("fingerprint", ColumnType::Varchar(255)).not_null());
    sync_table(&mut sess, &schema).await.unwrap();
    sess.exec("INSERT INTO [deploy_key] ([fingerprint]) VALUES ('aa'), ('bb')")
        .await
        .unwrap();

    sess.begin().await.unwrap();
    recreate_table(&mut sess, &schema).await.unwrap();
    sess.commit().await.unwrap();

    // Identity insert preserved the original ids through the copy.
    let rows = sess
        .query("SELECT id FROM [deploy_key] WHERE fingerprint = 'bb'")
        .await
        .unwrap();
    assert_eq!(rows[0].get_i64("id"), Some(2));
}
