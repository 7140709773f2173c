use crate::common::{build_client, health_url, test_config, MockClock, MockHttpClient, A, B};

#[tokio::test]
async fn test_donation_server_requires_healthy_status() {
    let http = MockHttpClient::new();
    http.respond(&health_url(A), 200, r#"{"status":"starting"}"#);
    http.healthy(B);

    let (client, _store) = build_client(test_config(&[A, B]), http.clone(), MockClock::new(0)).await;
    let server = client.donation_server().await.unwrap();

    assert_eq!(server.server_url, B);
    assert!(server.warning.is_none());
}

#[tokio::test]
async fn test_donation_server_falls_back_to_primary() {
    let http = MockHttpClient::new();

    let (client, _store) = build_client(test_config(&[A, B]), http.clone(), MockClock::new(0)).await;
    let server = client.donation_server().await.unwrap();

    assert_eq!(server.server_url, A);
    assert!(server.warning.unwrap().contains("No server reachable"));
}
