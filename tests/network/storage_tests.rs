use crate::common::create_temp_dir;
use kimaaka::core::network::{LocalStore, StoredState};

#[tokio::test]
async fn test_missing_file_reads_as_empty() {
    let dir = create_temp_dir();
    let store = LocalStore::new(Some(dir.path().join("storage.json"))).unwrap();
    assert_eq!(store.load().await, StoredState::default());
}

#[tokio::test]
async fn test_update_persists_camel_case_keys() {
    let dir = create_temp_dir();
    let path = dir.path().join("state").join("storage.json");
    let store = LocalStore::new(Some(path.clone())).unwrap();

    store
        .update(|s| {
            s.cached_api_key = Some("AIza-k".to_string());
            s.key_timestamp = Some(1_700_000_000_000);
            s.working_server_url = Some("http://a.test".to_string());
        })
        .await
        .unwrap();

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["cachedApiKey"], "AIza-k");
    assert_eq!(raw["keyTimestamp"], 1_700_000_000_000i64);
    assert_eq!(raw["workingServerUrl"], "http://a.test");
    assert!(raw.get("authToken").is_none());
    assert!(!path.with_extension("tmp").exists());

    let reopened = LocalStore::new(Some(path)).unwrap();
    assert_eq!(reopened.load().await.cached_api_key.as_deref(), Some("AIza-k"));
}

#[tokio::test]
async fn test_corrupt_file_reads_as_empty_and_is_replaced() {
    let dir = create_temp_dir();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = LocalStore::new(Some(path.clone())).unwrap();
    assert!(!store.corruption_reported());
    assert_eq!(store.load().await, StoredState::default());
    assert!(store.corruption_reported());

    store
        .update(|s| s.auth_token = Some("t".to_string()))
        .await
        .unwrap();
    assert_eq!(store.load().await.auth_token.as_deref(), Some("t"));
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let store = LocalStore::in_memory();
    store
        .update(|s| {
            s.user = Some(serde_json::json!({"name": "admin"}));
            s.last_used_server_index = Some(2);
        })
        .await
        .unwrap();
    store.clear().await.unwrap();
    assert_eq!(store.load().await, StoredState::default());
    assert!(store.path().is_none());
}

#[tokio::test]
async fn test_corruption_reported_only_on_first_load() {
    let dir = create_temp_dir();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "[1, 2").unwrap();

    let store = LocalStore::new(Some(path)).unwrap();
    for _ in 0..3 {
        assert_eq!(store.load().await, StoredState::default());
    }
    assert!(store.corruption_reported());

    let healthy = LocalStore::new(Some(dir.path().join("other.json"))).unwrap();
    healthy.load().await;
    assert!(!healthy.corruption_reported());
}
