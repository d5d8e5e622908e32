//! Migration registry and runner.
//!
//! A [`Migrator`] holds an ordered, append-only list of [`Migration`]s and
//! replays every one newer than the database's recorded version, each inside
//! its own transaction, strictly sequentially. A failure rolls back the
//! failing migration and aborts the whole pass; versions already committed
//! stay committed.
//!
//! # Append-only contract
//!
//! Sequence numbers are strictly increasing and must never be reused or
//! reordered once shipped: already-deployed databases may be at any
//! historical version and walk every intermediate step. To retire a shipped
//! migration, keep its number and replace the body with [`Migration::noop`].
//!
//! # Re-run tolerance
//!
//! The version advance executes inside the same transaction as the
//! migration body, but MySQL and MSSQL auto-commit DDL mid-transaction, so
//! a crash can leave a migration partially applied with the version not yet
//! advanced. Migrations therefore run at-least-once: write bodies so a
//! re-run is harmless (check whether a column/table already exists before
//! acting).

mod version;

pub use version::{VersionStore, DEFAULT_VERSION_TABLE};

use futures_util::future::BoxFuture;
use tracing::{error, info};

use crate::error::{MigrateError, Result};
use crate::session::Session;

/// A migration body: an async function over the caller's session.
pub type MigrationFn = for<'a> fn(&'a mut dyn Session) -> BoxFuture<'a, Result<()>>;

/// One registered migration: `(sequence number, human name, body)`.
pub struct Migration {
    version: i64,
    name: String,
    up: MigrationFn,
}

fn noop_up(_: &mut dyn Session) -> BoxFuture<'_, Result<()>> {
    Box::pin(async { Ok(()) })
}

impl Migration {
    /// Register a migration body under a sequence number.
    pub fn new(version: i64, name: impl Into<String>, up: MigrationFn) -> Self {
        Self {
            version,
            name: name.into(),
            up,
        }
    }

    /// A retired migration: keeps its sequence number, does nothing.
    pub fn noop(version: i64, name: impl Into<String>) -> Self {
        Self::new(version, name, noop_up)
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute the migration body.
    pub async fn run(&self, sess: &mut dyn Session) -> Result<()> {
        (self.up)(sess).await
    }
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish()
    }
}

/// The ordered migration registry and its runner.
pub struct Migrator {
    migrations: Vec<Migration>,
    store: VersionStore,
}

impl Migrator {
    /// Build a migrator over `migrations`.
    ///
    /// # Errors
    ///
    /// Rejects a registry whose sequence numbers are not strictly increasing
    /// or not positive - the append-only contract the whole system depends
    /// on.
    pub fn new(migrations: Vec<Migration>) -> Result<Self> {
        if let Some(m) = migrations.iter().find(|m| m.version < 1) {
            return Err(MigrateError::config(format!(
                "migration \"{}\" has non-positive version {}",
                m.name, m.version
            )));
        }
        for pair in migrations.windows(2) {
            if pair[1].version <= pair[0].version {
                return Err(MigrateError::config(format!(
                    "migration versions must be strictly increasing: \
                     \"{}\" ({}) follows \"{}\" ({})",
                    pair[1].name, pair[1].version, pair[0].name, pair[0].version
                )));
            }
        }
        Ok(Self {
            migrations,
            store: VersionStore::new(),
        })
    }

    /// Use a non-default version table name.
    pub fn with_version_table(mut self, table: impl Into<String>) -> Self {
        self.store = VersionStore::with_table(table);
        self
    }

    /// The version a fully migrated database records: the highest registered
    /// sequence number, or 0 for an empty registry.
    pub fn expected_version(&self) -> i64 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    /// The database's recorded version. `None` means never initialized.
    pub async fn current_version(&self, sess: &mut dyn Session) -> Result<Option<i64>> {
        self.store.ensure(sess).await?;
        self.store.get(sess).await
    }

    /// Verify the database is exactly at the expected version.
    pub async fn ensure_up_to_date(&self, sess: &mut dyn Session) -> Result<()> {
        let current = self
            .current_version(sess)
            .await?
            .ok_or(MigrateError::NotInitialized)?;
        let expected = self.expected_version();
        if current != expected {
            return Err(MigrateError::VersionMismatch { current, expected });
        }
        Ok(())
    }

    /// Apply every migration newer than the recorded version, in order.
    ///
    /// Each migration runs in its own transaction together with its version
    /// advance. The first failure rolls back, aborts the pass, and leaves
    /// the recorded version at the last committed migration. A run with
    /// nothing pending performs no writes.
    pub async fn run(&self, sess: &mut dyn Session) -> Result<()> {
        self.store.ensure(sess).await?;
        let current = match self.store.get(sess).await? {
            Some(version) => version,
            None => {
                self.store.insert_initial(sess).await?;
                0
            }
        };

        let expected = self.expected_version();
        if current > expected {
            return Err(MigrateError::VersionTooNew { current, expected });
        }

        let pending: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| m.version > current)
            .collect();
        if pending.is_empty() {
            info!("database schema is up to date at version {}", current);
            return Ok(());
        }

        info!(
            "applying {} migrations ({} -> {})",
            pending.len(),
            current,
            expected
        );

        for migration in pending {
            info!("migration[{}]: {}", migration.version, migration.name);
            sess.begin().await?;

            let applied = match migration.run(sess).await {
                Ok(()) => self.store.set(sess, migration.version).await,
                Err(e) => Err(e),
            };

            if let Err(e) = applied {
                if let Err(rollback_err) = sess.rollback().await {
                    error!(
                        "rollback after failed migration[{}] also failed: {}",
                        migration.version, rollback_err
                    );
                }
                return Err(MigrateError::Migration {
                    version: migration.version,
                    name: migration.name.clone(),
                    source: Box::new(e),
                });
            }

            sess.commit().await?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("migrations", &self.migrations.len())
            .field("expected_version", &self.expected_version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(_: &mut dyn Session) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn test_registry_accepts_increasing_versions() {
        let migrator = Migrator::new(vec![
            Migration::new(1, "one", body),
            Migration::new(2, "two", body),
            Migration::new(5, "five", body),
        ])
        .unwrap();
        assert_eq!(migrator.expected_version(), 5);
    }

    #[test]
    fn test_registry_rejects_reordered_versions() {
        let err = Migrator::new(vec![
            Migration::new(2, "two", body),
            Migration::new(1, "one", body),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn test_registry_rejects_duplicate_versions() {
        assert!(Migrator::new(vec![
            Migration::new(3, "a", body),
            Migration::new(3, "b", body),
        ])
        .is_err());
    }

    #[test]
    fn test_registry_rejects_non_positive_versions() {
        assert!(Migrator::new(vec![Migration::new(0, "zero", body)]).is_err());
    }

    #[test]
    fn test_empty_registry_expected_version_is_zero() {
        let migrator = Migrator::new(vec![]).unwrap();
        assert_eq!(migrator.expected_version(), 0);
    }

    #[test]
    fn test_noop_migration_keeps_its_number() {
        let migrator = Migrator::new(vec![
            Migration::new(1, "one", body),
            Migration::noop(2, "retired"),
            Migration::new(3, "three", body),
        ])
        .unwrap();
        assert_eq!(migrator.expected_version(), 3);
    }
}
