use crate::common::{build_client, stats_url, test_config, MockClock, MockHttpClient, A, B};
use kimaaka::core::network::ClientError;
use serde_json::json;

#[tokio::test]
async fn test_session_round_trip() {
    let http = MockHttpClient::new();
    let (client, store) = build_client(test_config(&[A]), http, MockClock::new(0)).await;
    let session = client.session();

    assert!(session.restore().await.is_none());
    assert!(matches!(session.bearer().await, Err(ClientError::Unauthorized)));

    session.save("tok-123", json!({"username": "root"})).await.unwrap();
    let (token, user) = session.restore().await.unwrap();
    assert_eq!(token, "tok-123");
    assert_eq!(user["username"], "root");
    assert_eq!(session.bearer().await.unwrap(), "Bearer tok-123");
    assert_eq!(store.load().await.auth_token.as_deref(), Some("tok-123"));
}

#[tokio::test]
async fn test_logout_clears_session_and_sticky() {
    let http = MockHttpClient::new();
    let (client, store) = build_client(test_config(&[A, B]), http, MockClock::new(0)).await;

    client.session().save("tok", json!({})).await.unwrap();
    client.context().set_sticky(B).await;
    client.session().logout().await.unwrap();

    let state = store.load().await;
    assert!(state.auth_token.is_none());
    assert!(state.user.is_none());
    assert!(state.working_server_url.is_none());
    assert!(client.context().sticky().is_none());
}

#[tokio::test]
async fn test_stats_use_saved_session_token() {
    let http = MockHttpClient::new();
    http.respond(&stats_url(A), 200, r#"{"totalApiKeys":2}"#);
    let (client, _store) = build_client(test_config(&[A]), http.clone(), MockClock::new(0)).await;

    client.session().save("saved-token", json!({})).await.unwrap();
    let stats = client.admin_stats(None).await.unwrap();

    assert_eq!(stats.total_api_keys, 2);
    assert_eq!(
        http.requests()[0].headers.get("Authorization").map(String::as_str),
        Some("Bearer saved-token")
    );
}
