//! Integration tests for the in-memory document store and the RESPONSE writer
//!
//! Run with: cargo test --test store_tests

use chrono::{Duration, Utc};
use serde_json::json;
use statusmigrate::{
    Database, Document, DocumentQuery, DocumentStore, InMemoryDocumentStore, LifeCycle,
    ResponseRecord, ResponseState, ResponseWriter, StoreError, TimeUuid, WriteOutcome,
};
use tempfile::tempdir;
use uuid::Uuid;

fn record(task_id: &str) -> ResponseRecord {
    ResponseRecord {
        version: json!(1),
        alias: "a1".into(),
        deploy_id: "d1".into(),
        task_id: task_id.into(),
        reason_id: "r1".into(),
        state: ResponseState::NotDone,
        remark: "later".into(),
        viewed: true,
        update_date: "2023-01-01".into(),
        life_cycle: LifeCycle::Active,
    }
}

fn status(app: Uuid, user: Uuid, days_ago: i64, id: &str) -> Document {
    Document::new(
        app,
        Database::Status,
        user,
        TimeUuid::min_for(Utc::now() - Duration::days(days_ago)),
        id,
        "{}",
    )
}

#[tokio::test]
async fn test_put_if_absent_twice_creates_one_document() {
    let store = InMemoryDocumentStore::new();
    let writer = ResponseWriter::new(&store);
    let app = Uuid::new_v4();
    let user = Uuid::new_v4();

    let first = writer.put_if_absent(&record("t1"), user, app).await.unwrap();
    let second = writer.put_if_absent(&record("t1"), user, app).await.unwrap();

    assert!(matches!(first, WriteOutcome::Inserted(_)));
    assert_eq!(second, WriteOutcome::AlreadyExists);

    let query = DocumentQuery::new(app, Database::Response).user(user).document_id("t1");
    let docs = store.find_documents(&query).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].content_type, "application/json");
    let stored: ResponseRecord = serde_json::from_str(&docs[0].content).unwrap();
    assert_eq!(stored, record("t1"));
}

#[tokio::test]
async fn test_natural_key_is_per_user_and_application() {
    let store = InMemoryDocumentStore::new();
    let writer = ResponseWriter::new(&store);
    let app = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    assert!(matches!(writer.put_if_absent(&record("t1"), alice, app).await.unwrap(), WriteOutcome::Inserted(_)));
    assert!(matches!(writer.put_if_absent(&record("t1"), bob, app).await.unwrap(), WriteOutcome::Inserted(_)));
    assert!(matches!(
        writer.put_if_absent(&record("t1"), alice, Uuid::new_v4()).await.unwrap(),
        WriteOutcome::Inserted(_)
    ));
    assert!(matches!(writer.put_if_absent(&record("t2"), alice, app).await.unwrap(), WriteOutcome::Inserted(_)));

    let all = DocumentQuery::new(app, Database::Response);
    assert_eq!(store.count(&all).await.unwrap(), 3);
}

#[tokio::test]
async fn test_existing_status_document_does_not_block_response() {
    let store = InMemoryDocumentStore::new();
    let app = Uuid::new_v4();
    let user = Uuid::new_v4();
    store.insert(status(app, user, 1, "t1")).await.unwrap();

    let outcome = ResponseWriter::new(&store)
        .put_if_absent(&record("t1"), user, app)
        .await
        .unwrap();
    assert!(matches!(outcome, WriteOutcome::Inserted(_)));
}

#[tokio::test]
async fn test_conditional_insert_is_atomic_per_key() {
    let store = InMemoryDocumentStore::new();
    let app = Uuid::new_v4();
    let user = Uuid::new_v4();
    let doc = |days: i64| {
        Document::new(
            app,
            Database::Response,
            user,
            TimeUuid::min_for(Utc::now() - Duration::days(days)),
            "t1",
            "{}",
        )
    };

    assert!(store.insert_if_absent(doc(2)).await.unwrap());
    // Different snapshot, same natural key.
    assert!(!store.insert_if_absent(doc(1)).await.unwrap());
    assert_eq!(store.count(&DocumentQuery::new(app, Database::Response)).await.unwrap(), 1);
}

#[tokio::test]
async fn test_limit_and_filters() {
    let store = InMemoryDocumentStore::new();
    let app = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    for (user, days, id) in [(alice, 5, "d1"), (alice, 3, "d1"), (bob, 1, "d2"), (bob, 9, "d3")] {
        store.insert(status(app, user, days, id)).await.unwrap();
    }

    let everyone = DocumentQuery::new(app, Database::Status);
    assert_eq!(store.find_documents(&everyone).await.unwrap().len(), 4);
    assert_eq!(store.find_documents(&everyone.clone().limit(1)).await.unwrap().len(), 1);

    let recent = everyone
        .clone()
        .users([alice, bob])
        .snapshot_after(TimeUuid::min_for(Utc::now() - Duration::days(4)));
    let mut ids: Vec<String> = store
        .find_documents(&recent)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.document_id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["d1".to_string(), "d2".to_string()]);
}

#[tokio::test]
async fn test_list_users_merges_month_buckets() {
    let store = InMemoryDocumentStore::new();
    let app = Uuid::new_v4();
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    for month in [1, 6, 12] {
        store.add_user(app, month, user).await.unwrap();
    }
    store.add_user(app, 0, other).await.unwrap();

    assert_eq!(store.list_users(app).await.unwrap(), vec![user]);
    assert!(store.list_users(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_snapshot_file_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("documents.json");
    let app = Uuid::new_v4();
    let user = Uuid::new_v4();
    let doc = status(app, user, 2, "d1");

    {
        let store = InMemoryDocumentStore::open(&path).unwrap();
        store.add_user(app, 4, user).await.unwrap();
        store.insert(doc.clone()).await.unwrap();
        store.close().await.unwrap();
    }
    assert!(path.exists());

    let reopened = InMemoryDocumentStore::open(&path).unwrap();
    assert_eq!(reopened.list_users(app).await.unwrap(), vec![user]);
    let docs = reopened
        .find_documents(&DocumentQuery::new(app, Database::Status))
        .await
        .unwrap();
    assert_eq!(docs, vec![doc]);
}

#[tokio::test]
async fn test_closed_store_rejects_calls() {
    let store = InMemoryDocumentStore::new();
    store.close().await.unwrap();
    store.close().await.unwrap();

    let err = store.list_users(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}

#[tokio::test]
async fn test_open_corrupt_snapshot_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("documents.json");
    std::fs::write(&path, "{\"version\": 1").unwrap();

    assert!(matches!(
        InMemoryDocumentStore::open(&path),
        Err(StoreError::Corrupt(_))
    ));
}
