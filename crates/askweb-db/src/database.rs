use askweb_core::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::{DatabaseConfig, validate_table_name};
use crate::repository::ConversationRepository;

/// Schema version stamped into `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 3;

/// Owns the connection pool, brings the schema up to date and vends the
/// conversation repository.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    table: String,
}

impl Database {
    /// Open (creating if missing) the SQLite file named by `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        config.validate()?;

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to open {}: {e}",
                    config.path.display()
                ))
            })?;

        tracing::debug!(path = %config.path.display(), table = %config.table, "Database opened");
        Ok(Self {
            pool,
            table: config.table.clone(),
        })
    }

    /// Create a `Database` from an existing pool (useful for testing).
    pub fn from_pool(pool: SqlitePool, table: &str) -> Result<Self, AppError> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Bring the schema to [`SCHEMA_VERSION`].
    ///
    /// A fresh file (version 0) gets the current schema and stamp in one
    /// step. An older file gets each pending migration in its own
    /// transaction, so a failure leaves it at the last good version.
    ///
    /// The stamp covers the whole file while tables are per configuration,
    /// so the configured table (and the indexes of every version already
    /// applied) is created on every call.
    pub async fn migrate(&self) -> Result<(), AppError> {
        let current = self.user_version().await?;

        if current > SCHEMA_VERSION {
            return Err(AppError::DatabaseError(format!(
                "Database schema version {current} is newer than supported version {SCHEMA_VERSION}"
            )));
        }

        if current == 0 {
            self.apply(SCHEMA_VERSION, &schema_sql(&self.table, SCHEMA_VERSION))
                .await?;
            tracing::info!(version = SCHEMA_VERSION, "Database schema created");
            return Ok(());
        }

        self.apply(current, &schema_sql(&self.table, current)).await?;
        tracing::debug!(version = current, table = %self.table, "Table ensured");

        for version in (current + 1)..=SCHEMA_VERSION {
            self.apply(version, &migration_sql(version, &self.table))
                .await?;
            tracing::info!(version, "Database migration applied");
        }
        Ok(())
    }

    async fn apply(&self, version: i64, statements: &[String]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| migration_error(version, e))?;

        for sql in statements {
            sqlx::query(sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| migration_error(version, e))?;
        }

        // PRAGMA takes no bind parameters; `version` is an integer we own.
        sqlx::query(&format!("PRAGMA user_version = {version}"))
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_error(version, e))?;

        tx.commit().await.map_err(|e| migration_error(version, e))
    }

    /// The stamped schema version; 0 for a file never migrated.
    pub async fn user_version(&self) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    /// Get a [`ConversationRepository`] backed by this pool.
    pub fn conversation_repo(&self) -> ConversationRepository {
        ConversationRepository::new(self.pool.clone(), &self.table)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
            query TEXT NOT NULL,
            results TEXT NOT NULL,
            summary TEXT NOT NULL
        )"
    )
}

/// The table as it looks at `version`: creation plus every migration up to
/// and including it. Every statement is idempotent.
fn schema_sql(table: &str, version: i64) -> Vec<String> {
    let mut statements = vec![create_table_sql(table)];
    statements.extend((2..=version).flat_map(|v| migration_sql(v, table)));
    statements
}

/// Statements that move the schema from `version - 1` to `version`.
fn migration_sql(version: i64, table: &str) -> Vec<String> {
    match version {
        2 => vec![format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_timestamp ON {table}(timestamp DESC)"
        )],
        // Version 3 changed only how `results` is written (JSON text rather
        // than a blob); reads cast either form.
        _ => Vec::new(),
    }
}

fn migration_error(version: i64, e: sqlx::Error) -> AppError {
    AppError::DatabaseError(format!("Migration to version {version} failed: {e}"))
}
