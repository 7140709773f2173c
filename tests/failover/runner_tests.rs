use crate::common::{build_failover, health_url, MockClock, MockHttpClient, A, B, C};
use kimaaka::core::network::{ClientError, LocalStore, SelectionPolicy};
use kimaaka::core::failover::OperationRunner;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test]
async fn test_success_records_sticky_and_last_used() {
    let http = MockHttpClient::new();
    http.healthy(B);
    let clock = MockClock::new(42_000);

    let f = build_failover(&[A, B], http.clone(), clock, Arc::new(LocalStore::in_memory())).await;
    let result = f
        .runner
        .run(SelectionPolicy::Sequential, None, |base| async move {
            Ok::<_, String>(format!("served by {}", base))
        })
        .await
        .unwrap();

    assert_eq!(result, format!("served by {}", B));
    let state = f.store.load().await;
    assert_eq!(state.working_server_url.as_deref(), Some(B));
    assert_eq!(state.last_used_server.as_deref(), Some(B));
    assert_eq!(state.last_used_server_index, Some(1));
    assert_eq!(state.last_server_use_time, Some(42_000));
}

#[tokio::test]
async fn test_operation_failure_moves_to_next_server() {
    let http = MockHttpClient::new();
    for base in [A, B, C] {
        http.healthy(base);
    }

    let f = build_failover(&[A, B, C], http.clone(), MockClock::new(0), Arc::new(LocalStore::in_memory())).await;
    let seen = Mutex::new(Vec::new());
    let result = f
        .runner
        .run(SelectionPolicy::Sequential, None, |base| {
            seen.lock().unwrap().push(base.clone());
            async move {
                if base == A {
                    Err("HTTP 500".to_string())
                } else {
                    Ok(base)
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(result, B);
    assert_eq!(*seen.lock().unwrap(), vec![A.to_string(), B.to_string()]);
    assert!(f.context.is_quarantined(A));
    assert_eq!(f.context.sticky().as_deref(), Some(B));
}

#[tokio::test]
async fn test_budget_exhaustion_reports_attempts_and_last_error() {
    let http = MockHttpClient::new();
    for base in [A, B, C] {
        http.healthy(base);
    }

    let f = build_failover(&[A, B, C], http.clone(), MockClock::new(0), Arc::new(LocalStore::in_memory())).await;
    let err = f
        .runner
        .run(SelectionPolicy::Sequential, None, |base| async move {
            Err::<(), _>(format!("{} rejected request", base))
        })
        .await
        .unwrap_err();

    match err {
        ClientError::AllServersFailed {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_error, format!("{} rejected request", C));
        }
        other => panic!("expected AllServersFailed, got {:?}", other),
    }
    assert!(f.context.sticky().is_none());
}

#[tokio::test]
async fn test_explicit_budget_limits_attempts() {
    let http = MockHttpClient::new();
    for base in [A, B, C] {
        http.healthy(base);
    }

    let f = build_failover(&[A, B, C], http.clone(), MockClock::new(0), Arc::new(LocalStore::in_memory())).await;
    let calls = Mutex::new(0usize);
    let err = f
        .runner
        .run(SelectionPolicy::Sequential, Some(2), |_base| {
            *calls.lock().unwrap() += 1;
            async { Err::<(), _>("nope") }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::AllServersFailed { attempts: 2, .. }));
    assert_eq!(*calls.lock().unwrap(), 2);
}

#[tokio::test]
async fn test_unreachable_pool_propagates_selector_error() {
    let http = MockHttpClient::new();
    let f = build_failover(&[A, B], http.clone(), MockClock::new(0), Arc::new(LocalStore::in_memory())).await;

    let err = f
        .runner
        .run(SelectionPolicy::Sequential, None, |_base| async { Ok::<_, String>(()) })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NoServerReachable { tried: 2 }));
}

#[tokio::test]
async fn test_selector_failure_mid_run_keeps_last_error() {
    let http = MockHttpClient::new();
    http.healthy(A);
    http.timeout(&health_url(B));

    let f = build_failover(&[A, B], http.clone(), MockClock::new(0), Arc::new(LocalStore::in_memory())).await;
    let err = f
        .runner
        .run(SelectionPolicy::Sequential, None, |_base| async { Err::<(), _>("HTTP 502") })
        .await
        .unwrap_err();

    // A answered health but failed the operation; the second resolution
    // found nothing healthy left.
    match err {
        ClientError::AllServersFailed { attempts, last_error } => {
            assert_eq!(attempts, 1);
            assert!(last_error.contains("No server reachable"));
        }
        other => panic!("expected AllServersFailed, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_pause_after_last_pool_member_fails() {
    let http = MockHttpClient::new();
    http.healthy(A);
    http.healthy(B);

    let f = build_failover(&[A, B], http.clone(), MockClock::new(0), Arc::new(LocalStore::in_memory())).await;
    let runner = OperationRunner::new(f.selector.clone(), 300);

    let start = Instant::now();
    let err = runner
        .run(SelectionPolicy::Sequential, Some(3), |_base| async move {
            Err::<(), _>("x".to_string())
        })
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    match err {
        ClientError::AllServersFailed { attempts, last_error } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_error, "x");
        }
        other => panic!("expected AllServersFailed, got {:?}", other),
    }
    // One pause: after B empties the pool with budget left, none after the final attempt
    assert!(elapsed >= Duration::from_millis(300), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(600), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_no_pause_when_budget_is_spent() {
    let http = MockHttpClient::new();
    http.healthy(A);
    http.healthy(B);

    let f = build_failover(&[A, B], http.clone(), MockClock::new(0), Arc::new(LocalStore::in_memory())).await;
    let runner = OperationRunner::new(f.selector.clone(), 300);

    let start = Instant::now();
    let err = runner
        .run(SelectionPolicy::Sequential, Some(2), |_base| async move {
            Err::<(), _>("x".to_string())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::AllServersFailed { attempts: 2, .. }));
    assert!(start.elapsed() < Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_no_pause_while_pool_has_servers() {
    let http = MockHttpClient::new();
    for base in [A, B, C] {
        http.healthy(base);
    }

    let f = build_failover(&[A, B, C], http.clone(), MockClock::new(0), Arc::new(LocalStore::in_memory())).await;
    let runner = OperationRunner::new(f.selector.clone(), 300);

    let start = Instant::now();
    let served = runner
        .run(SelectionPolicy::Sequential, None, |base| async move {
            if base == C {
                Ok(base)
            } else {
                Err("HTTP 502".to_string())
            }
        })
        .await
        .unwrap();

    assert_eq!(served, C);
    assert!(start.elapsed() < Duration::from_millis(300));
}
