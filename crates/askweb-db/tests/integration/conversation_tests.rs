use askweb_core::models::{NewConversation, SearchResult};
use askweb_core::traits::ConversationStore;

use crate::integration::common::{open, setup_test_db};

fn conversation(query: &str, urls: &[&str], summary: &str) -> NewConversation {
    let results: Vec<SearchResult> = urls
        .iter()
        .map(|url| SearchResult::new("title", *url, ""))
        .collect();
    NewConversation::new(query, &results, summary)
}

#[tokio::test]
async fn save_and_get_round_trips_urls() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.conversation_repo();

    let id = repo
        .save(&conversation(
            "rust async",
            &["https://tokio.rs/", "https://rust-lang.github.io/async-book/"],
            "Async Rust uses futures.",
        ))
        .await
        .unwrap();
    assert_eq!(id, 1);

    let stored = repo.get(id).await.unwrap().expect("Should find the conversation");
    assert_eq!(stored.id, 1);
    assert_eq!(stored.query, "rust async");
    assert_eq!(
        stored.result_urls,
        vec!["https://tokio.rs/", "https://rust-lang.github.io/async-book/"]
    );
    assert_eq!(stored.summary, "Async Rust uses futures.");
}

#[tokio::test]
async fn get_missing_id_is_none() {
    let (db, _dir) = setup_test_db().await;
    assert!(db.conversation_repo().get(42).await.unwrap().is_none());
}

#[tokio::test]
async fn ids_increase_and_count_tracks_rows() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.conversation_repo();

    let first = repo.save(&conversation("a", &[], "one")).await.unwrap();
    let second = repo.save(&conversation("b", &[], "two")).await.unwrap();
    assert!(second > first);
    assert_eq!(repo.count().await.unwrap(), 2);

    let stored = repo.get(first).await.unwrap().unwrap();
    assert!(stored.result_urls.is_empty());
}

#[tokio::test]
async fn search_matches_summary_substring_newest_first() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.conversation_repo();

    repo.save(&conversation("q1", &[], "The borrow checker enforces aliasing rules."))
        .await
        .unwrap();
    repo.save(&conversation("q2", &[], "Cargo builds crates."))
        .await
        .unwrap();
    repo.save(&conversation("q3", &[], "More on the Borrow Checker."))
        .await
        .unwrap();

    let hits = repo.search("borrow checker").await.unwrap();
    let queries: Vec<_> = hits.iter().map(|c| c.query.as_str()).collect();
    assert_eq!(queries, vec!["q3", "q1"]);

    assert!(repo.search("python").await.unwrap().is_empty());
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.conversation_repo();

    repo.save(&conversation("q1", &[], "Coverage reached 100% today."))
        .await
        .unwrap();
    repo.save(&conversation("q2", &[], "Coverage reached 1000 lines."))
        .await
        .unwrap();

    let hits = repo.search("100%").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].query, "q1");
    assert!(repo.search("_").await.unwrap().is_empty());
}

#[tokio::test]
async fn recent_is_limited_and_newest_first() {
    let (db, _dir) = setup_test_db().await;
    let repo = db.conversation_repo();

    for n in 1..=4 {
        repo.save(&conversation(&format!("q{n}"), &[], "s"))
            .await
            .unwrap();
    }

    let recent = repo.recent(2).await.unwrap();
    let queries: Vec<_> = recent.iter().map(|c| c.query.as_str()).collect();
    assert_eq!(queries, vec!["q4", "q3"]);
}

#[tokio::test]
async fn store_trait_delegates_to_repository() {
    let (db, _dir) = setup_test_db().await;
    let store = db.conversation_repo();

    let id = ConversationStore::save(&store, &conversation("q", &["https://a.example/"], "sum"))
        .await
        .unwrap();
    let found = ConversationStore::get(&store, id).await.unwrap().unwrap();
    assert_eq!(found.result_urls, vec!["https://a.example/"]);
    assert_eq!(ConversationStore::search(&store, "sum").await.unwrap().len(), 1);
}

#[tokio::test]
async fn custom_table_name_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir, "research_log").await;
    db.migrate().await.unwrap();

    db.conversation_repo()
        .save(&conversation("q", &[], "s"))
        .await
        .unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM research_log")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = open(&dir, "conversations").await;
        db.migrate().await.unwrap();
        db.conversation_repo()
            .save(&conversation("persisted", &[], "still here"))
            .await
            .unwrap();
        db.close().await;
    }

    let db = open(&dir, "conversations").await;
    db.migrate().await.unwrap();
    let stored = db.conversation_repo().get(1).await.unwrap().unwrap();
    assert_eq!(stored.query, "persisted");
}
