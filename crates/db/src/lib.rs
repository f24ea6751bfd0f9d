//! SQLite connection pool and migration runner.
//!
//! Modules contribute their schema as [`Migration`]s; [`Database::migrate`]
//! applies each `(module, id)` pair at most once and records it in the
//! `_migrations` ledger table.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use literalura_kernel::settings::DatabaseSettings;
use literalura_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use tracing::instrument;

const LEDGER_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    );
"#;

/// Shared SQLite connection pool.
///
/// Cloning is cheap; every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect using the configured database URL, creating the file if missing.
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(&settings.url)
            .with_context(|| format!("invalid database url '{}'", settings.url))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(settings.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to '{}'", settings.url))?;

        tracing::info!(
            target: "literalura-db",
            url = %settings.url,
            max_connections = settings.max_connections,
            "database pool ready"
        );

        Ok(Self { pool })
    }

    /// Connect to a private in-memory database.
    ///
    /// The pool is limited to one connection; a second connection would see a
    /// different, empty database.
    pub async fn connect_in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("failed to open in-memory database")?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply every migration not yet recorded in the ledger, in the given order.
    ///
    /// Each migration runs in its own transaction together with its ledger row.
    /// Returns the number of migrations applied by this call.
    #[instrument(skip_all, fields(total = migrations.len()))]
    pub async fn migrate(&self, migrations: &[(String, Migration)]) -> anyhow::Result<usize> {
        sqlx::raw_sql(LEDGER_DDL)
            .execute(&self.pool)
            .await
            .context("failed to create migration ledger")?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let done: Option<(String,)> =
                sqlx::query_as("SELECT id FROM _migrations WHERE module = ? AND id = ?")
                    .bind(module)
                    .bind(migration.id)
                    .fetch_optional(&self.pool)
                    .await?;
            if done.is_some() {
                tracing::debug!(module = %module, id = migration.id, "migration already applied");
                continue;
            }

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(migration.up)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("migration {}/{} failed", module, migration.id))?;
            sqlx::query("INSERT INTO _migrations (module, id) VALUES (?, ?)")
                .bind(module)
                .bind(migration.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::info!(module = %module, id = migration.id, "migration applied");
            applied += 1;
        }

        Ok(applied)
    }

    /// Open a write transaction that takes the database write lock up front.
    ///
    /// Deferred transactions that read first and write later fail with
    /// `SQLITE_BUSY` when another writer got there in between; `BEGIN IMMEDIATE`
    /// makes concurrent writers queue on `busy_timeout` instead.
    pub async fn begin_immediate(&self) -> sqlx::Result<sqlx::Transaction<'static, Sqlite>> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrations() -> Vec<(String, Migration)> {
        vec![(
            "books".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE shelf (id INTEGER PRIMARY KEY, name TEXT NOT NULL);",
            },
        )]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let db = Database::connect_in_memory().await.unwrap();

        assert_eq!(db.migrate(&migrations()).await.unwrap(), 1);
        assert_eq!(db.migrate(&migrations()).await.unwrap(), 0);

        sqlx::query("INSERT INTO shelf (name) VALUES ('a')")
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_migration_is_not_recorded() {
        let db = Database::connect_in_memory().await.unwrap();
        let broken = vec![(
            "books".to_string(),
            Migration {
                id: "001_broken",
                up: "CREATE TABLE nope (",
            },
        )];

        assert!(db.migrate(&broken).await.is_err());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let settings = DatabaseSettings {
            url: format!("sqlite:{}", path.display()),
            ..DatabaseSettings::default()
        };

        let db = Database::connect(&settings).await.unwrap();
        db.migrate(&migrations()).await.unwrap();
        db.close().await;

        assert!(path.exists());
    }
}
