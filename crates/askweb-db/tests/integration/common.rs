use askweb_db::{Database, DatabaseConfig};
use tempfile::TempDir;

/// Opens a migrated database in a fresh temporary directory.
///
/// The `TempDir` must be kept in scope for the test duration; dropping it
/// deletes the file.
pub async fn setup_test_db() -> (Database, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = open(&dir, "conversations").await;
    db.migrate().await.expect("Failed to migrate");
    (db, dir)
}

/// Opens `ask-web.db` inside `dir` without migrating.
pub async fn open(dir: &TempDir, table: &str) -> Database {
    let config = DatabaseConfig::new(dir.path().join("ask-web.db")).with_table(table);
    Database::connect(&config)
        .await
        .expect("Failed to open database")
}
