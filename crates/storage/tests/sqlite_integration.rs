use storage::repository::KvStore;
use storage::sqlite::SqliteKv;

#[tokio::test]
async fn kv_round_trips_through_sqlite() {
    let kv = SqliteKv::connect("sqlite::memory:").await.unwrap();

    assert!(kv.get("exam.results").await.unwrap().is_none());

    kv.set("exam.results", "[]").await.unwrap();
    kv.set("exam.results", r#"[{"ok":true}]"#).await.unwrap();
    assert_eq!(
        kv.get("exam.results").await.unwrap().as_deref(),
        Some(r#"[{"ok":true}]"#)
    );

    kv.delete("exam.results").await.unwrap();
    assert!(kv.get("exam.results").await.unwrap().is_none());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("kv.db").display());

    let first = SqliteKv::connect(&url).await.unwrap();
    first.set("k", "v").await.unwrap();
    drop(first);

    // reconnecting re-runs migrations against the existing schema
    let second = SqliteKv::connect(&url).await.unwrap();
    assert_eq!(second.get("k").await.unwrap().as_deref(), Some("v"));
}
