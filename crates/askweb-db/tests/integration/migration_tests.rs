use askweb_core::NewConversation;
use askweb_db::{Database, DatabaseConfig, SCHEMA_VERSION};

use crate::integration::common::open;

async fn index_exists(db: &Database, name: &str) -> bool {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?")
            .bind(name)
            .fetch_one(db.pool())
            .await
            .unwrap();
    count == 1
}

#[tokio::test]
async fn fresh_database_is_stamped_current() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir, "conversations").await;
    assert_eq!(db.user_version().await.unwrap(), 0);

    db.migrate().await.unwrap();
    assert_eq!(db.user_version().await.unwrap(), SCHEMA_VERSION);
    assert!(index_exists(&db, "idx_conversations_timestamp").await);
    assert_eq!(db.conversation_repo().count().await.unwrap(), 0);
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir, "conversations").await;
    db.migrate().await.unwrap();
    db.migrate().await.unwrap();
    assert_eq!(db.user_version().await.unwrap(), SCHEMA_VERSION);
}

#[tokio::test]
async fn older_version_applies_pending_migrations_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir, "conversations").await;

    // A version-1 file: the table without the timestamp index, with a row
    // whose results were written as a blob.
    sqlx::query(
        "CREATE TABLE conversations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
            query TEXT NOT NULL,
            results TEXT NOT NULL,
            summary TEXT NOT NULL
        )",
    )
    .execute(db.pool())
    .await
    .unwrap();
    sqlx::query("INSERT INTO conversations (query, results, summary) VALUES (?, ?, ?)")
        .bind("old query")
        .bind(br#"["https://old.example/"]"#.to_vec())
        .bind("old summary")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query("PRAGMA user_version = 1")
        .execute(db.pool())
        .await
        .unwrap();

    db.migrate().await.unwrap();

    assert_eq!(db.user_version().await.unwrap(), SCHEMA_VERSION);
    assert!(index_exists(&db, "idx_conversations_timestamp").await);

    let old = db.conversation_repo().get(1).await.unwrap().unwrap();
    assert_eq!(old.query, "old query");
    assert_eq!(old.result_urls, vec!["https://old.example/"]);
}

#[tokio::test]
async fn second_table_in_a_stamped_file_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir, "conversations").await;
    db.migrate().await.unwrap();
    db.close().await;

    let db = open(&dir, "research_log").await;
    assert_eq!(db.user_version().await.unwrap(), SCHEMA_VERSION);
    db.migrate().await.unwrap();

    let repo = db.conversation_repo();
    let id = repo
        .save(&NewConversation {
            query: "second table".into(),
            result_urls: vec!["https://a.example/".into()],
            summary: "stored".into(),
        })
        .await
        .unwrap();
    assert_eq!(repo.get(id).await.unwrap().unwrap().summary, "stored");
    assert!(index_exists(&db, "idx_research_log_timestamp").await);
    assert_eq!(db.user_version().await.unwrap(), SCHEMA_VERSION);
}

#[tokio::test]
async fn newer_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir, "conversations").await;
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION + 1))
        .execute(db.pool())
        .await
        .unwrap();

    let err = db.migrate().await.unwrap_err();
    assert!(err.to_string().contains("newer than supported"));
}

#[tokio::test]
async fn invalid_table_name_is_rejected_before_opening() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig::new(dir.path().join("ask-web.db")).with_table("x; DROP TABLE y");
    assert!(Database::connect(&config).await.is_err());
    assert!(!dir.path().join("ask-web.db").exists());
}
