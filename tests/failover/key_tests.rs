use crate::common::{build_client, health_url, key_url, test_config, MockClock, MockHttpClient, A, B};
use kimaaka::core::failover::KeyCache;
use kimaaka::core::network::{ClientError, LocalStore};
use std::sync::Arc;
use std::time::Duration;

const MINUTE: i64 = 60 * 1000;
const HOUR: i64 = 60 * MINUTE;

#[tokio::test]
async fn test_key_cache_round_trip_within_ttl() {
    let clock = MockClock::new(1_000);
    let cache = KeyCache::new(Arc::new(LocalStore::in_memory()), clock.clone(), 7200);

    assert_eq!(cache.get().await, None);
    cache.put("AIza-first").await.unwrap();
    assert_eq!(cache.get().await.as_deref(), Some("AIza-first"));

    cache.put("AIza-second").await.unwrap();
    assert_eq!(cache.get().await.as_deref(), Some("AIza-second"));
}

#[tokio::test]
async fn test_key_cache_ttl_boundary() {
    let clock = MockClock::new(0);
    let cache = KeyCache::new(Arc::new(LocalStore::in_memory()), clock.clone(), 7200);
    cache.put("AIza-cached").await.unwrap();

    clock.set(HOUR + 59 * MINUTE);
    assert_eq!(cache.get().await.as_deref(), Some("AIza-cached"));

    clock.set(2 * HOUR + MINUTE);
    assert_eq!(cache.get().await, None);
    // Stale entry stays until overwritten
    assert_eq!(cache.entry().await.map(|e| e.value).as_deref(), Some("AIza-cached"));
}

#[tokio::test]
async fn test_key_without_timestamp_is_cleared_on_read() {
    let store = Arc::new(LocalStore::in_memory());
    store
        .update(|s| s.cached_api_key = Some("AIza-orphan".to_string()))
        .await
        .unwrap();
    let cache = KeyCache::new(store.clone(), MockClock::new(0), 7200);
    assert_eq!(cache.get().await, None);

    let state = store.load().await;
    assert_eq!(state.cached_api_key, None);
    assert_eq!(state.key_timestamp, None);
}

#[tokio::test]
async fn test_timestamp_without_key_is_cleared() {
    let store = Arc::new(LocalStore::in_memory());
    store.update(|s| s.key_timestamp = Some(500)).await.unwrap();
    let cache = KeyCache::new(store.clone(), MockClock::new(1_000), 7200);

    assert_eq!(cache.get().await, None);
    assert_eq!(store.load().await.key_timestamp, None);

    cache.put("AIza-fresh").await.unwrap();
    assert_eq!(cache.get().await.as_deref(), Some("AIza-fresh"));
}

#[tokio::test]
async fn test_get_cached_api_key_fetches_then_serves_cache() {
    let http = MockHttpClient::new();
    http.healthy(A);
    http.respond(&key_url(A), 200, r#"{"geminiApiKey":"AIza-from-server"}"#);
    let clock = MockClock::new(0);

    let (client, store) = build_client(test_config(&[A]), http.clone(), clock.clone()).await;

    let first = client.get_cached_api_key().await.unwrap();
    assert_eq!(first.key, "AIza-from-server");
    assert!(!first.from_cache);
    assert_eq!(store.load().await.key_timestamp, Some(0));

    let second = client.get_cached_api_key().await.unwrap();
    assert!(second.from_cache);
    assert_eq!(http.call_count(&key_url(A)), 1);
}

#[tokio::test]
async fn test_expired_key_triggers_refetch() {
    let http = MockHttpClient::new();
    http.healthy(A);
    http.queue(&key_url(A), 200, r#"{"geminiApiKey":"AIza-old"}"#);
    http.queue(&key_url(A), 200, r#"{"geminiApiKey":"AIza-new"}"#);
    let clock = MockClock::new(0);

    let (client, _store) = build_client(test_config(&[A]), http.clone(), clock.clone()).await;
    assert_eq!(client.get_cached_api_key().await.unwrap().key, "AIza-old");

    clock.set(HOUR + 59 * MINUTE);
    assert!(client.get_cached_api_key().await.unwrap().from_cache);

    clock.set(2 * HOUR + MINUTE);
    let lease = client.get_cached_api_key().await.unwrap();
    assert_eq!(lease.key, "AIza-new");
    assert!(!lease.from_cache);
}

#[tokio::test]
async fn test_server_without_key_is_quarantined() {
    let http = MockHttpClient::new();
    http.healthy(A);
    http.healthy(B);
    http.respond(&key_url(A), 200, r#"{"geminiApiKey":""}"#);
    http.respond(&key_url(B), 200, r#"{"geminiApiKey":"AIza-b"}"#);

    let (client, _store) = build_client(test_config(&[A, B]), http.clone(), MockClock::new(0)).await;
    // Random policy may or may not try A first
    let lease = client.refresh_api_key().await.unwrap();
    assert_eq!(lease.key, "AIza-b");
    if http.call_count(&key_url(A)) > 0 {
        assert!(client.context().is_quarantined(A));
    }
    assert_eq!(client.context().sticky().as_deref(), Some(B));
}

#[tokio::test]
async fn test_key_fetch_failure_surfaces_status() {
    let http = MockHttpClient::new();
    http.healthy(A);
    http.respond(&key_url(A), 503, "");

    let (client, _store) = build_client(test_config(&[A]), http.clone(), MockClock::new(0)).await;
    match client.get_cached_api_key().await.unwrap_err() {
        ClientError::AllServersFailed { attempts, last_error } => {
            assert_eq!(attempts, 1);
            assert_eq!(last_error, "HTTP 503");
        }
        other => panic!("expected AllServersFailed, got {:?}", other),
    }
    assert_eq!(http.call_count(&health_url(A)), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hung_key_endpoint_times_out() {
    let http = MockHttpClient::new();
    http.healthy(A);
    http.respond(&key_url(A), 200, r#"{"geminiApiKey":"AIza-late"}"#);
    http.hang(&key_url(A), Duration::from_secs(60));

    let mut config = test_config(&[A]);
    config.timeouts.key_fetch_ms = 2000;
    let (client, store) = build_client(config, http.clone(), MockClock::new(0)).await;

    match client.get_cached_api_key().await.unwrap_err() {
        ClientError::AllServersFailed { attempts, last_error } => {
            assert_eq!(attempts, 1);
            assert_eq!(last_error, "Request timeout (2s)");
        }
        other => panic!("expected AllServersFailed, got {:?}", other),
    }
    assert_eq!(store.load().await.cached_api_key, None);
}
