use super::*;

async fn exercise(store: &dyn KeyValueStore) {
    assert_eq!(store.get("missing").await.unwrap(), None);

    store.set("video_status_1_2_3", "{\"a\":1}").await.unwrap();
    store.set("lesson_content_1_2_3", "text").await.unwrap();
    assert_eq!(
        store.get("video_status_1_2_3").await.unwrap().as_deref(),
        Some("{\"a\":1}")
    );

    // last writer wins
    store.set("video_status_1_2_3", "{\"a\":2}").await.unwrap();
    assert_eq!(
        store.get("video_status_1_2_3").await.unwrap().as_deref(),
        Some("{\"a\":2}")
    );

    assert_eq!(
        store.keys().await.unwrap(),
        vec![
            "lesson_content_1_2_3".to_string(),
            "video_status_1_2_3".to_string()
        ]
    );

    store.remove("video_status_1_2_3").await.unwrap();
    store.remove("video_status_1_2_3").await.unwrap();
    assert_eq!(store.get("video_status_1_2_3").await.unwrap(), None);
}

#[tokio::test]
async fn test_memory_store() {
    exercise(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("nested").join("cache"));

    assert!(store.keys().await.unwrap().is_empty());
    exercise(&store).await;
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    FileStore::new(dir.path())
        .set("video_status_9_0_1", "persisted")
        .await
        .unwrap();

    let reopened = FileStore::new(dir.path());
    assert_eq!(
        reopened.get("video_status_9_0_1").await.unwrap().as_deref(),
        Some("persisted")
    );
}

#[test]
fn test_sanitize_filename() {
    assert_eq!(sanitize_filename("a/b:c*d"), "a_b_c_d");
    assert_eq!(sanitize_filename("video_status_1_2_3"), "video_status_1_2_3");
}
