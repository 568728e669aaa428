mod common;

use axum::http::HeaderMap;
use common::TestConfig;
use rzero::application::services::Admission;
use rzero::domain::policy::Scope;
use std::net::IpAddr;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_admit_exactly_the_limit() {
    let (state, _clock) = common::memory_state(&TestConfig {
        limit: 50,
        window_seconds: 60,
        ..TestConfig::default()
    });
    let peer: IpAddr = "203.0.113.9".parse().unwrap();

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let limiter = state.limiter.clone();
            tokio::spawn(async move {
                limiter
                    .check(&Scope::default_scope(), Some(peer), &HeaderMap::new())
                    .await
            })
        })
        .collect();

    let mut admitted = 0;
    let mut denied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Admission::Admitted(_) => admitted += 1,
            Admission::Denied(_) => denied += 1,
            other => panic!("unexpected admission: {:?}", other),
        }
    }

    assert_eq!(admitted, 50);
    assert_eq!(denied, 50);

    // Every request was counted, admitted or not
    let identity = state.limiter.identify(Some(peer), &HeaderMap::new());
    let inspection = state
        .limiter
        .inspect(&Scope::default_scope(), &identity)
        .await
        .unwrap();
    assert_eq!(inspection.estimate.current, 100);
    assert!(!inspection.decision.allowed);
}

#[tokio::test]
async fn test_clients_and_scopes_do_not_share_counters() {
    let (state, _clock) = common::memory_state(&TestConfig {
        limit: 1,
        overrides: "api:auth=1/60",
        ..TestConfig::default()
    });
    let a: IpAddr = "198.51.100.1".parse().unwrap();
    let b: IpAddr = "198.51.100.2".parse().unwrap();
    let auth = Scope::new("api:auth");
    let headers = HeaderMap::new();

    assert!(state.limiter.check(&Scope::default_scope(), Some(a), &headers).await.is_allowed());
    assert!(!state.limiter.check(&Scope::default_scope(), Some(a), &headers).await.is_allowed());

    assert!(state.limiter.check(&Scope::default_scope(), Some(b), &headers).await.is_allowed());
    assert!(state.limiter.check(&auth, Some(a), &headers).await.is_allowed());
}

#[tokio::test]
async fn test_idle_client_recovers_full_quota() {
    let (state, clock) = common::memory_state(&TestConfig::default());
    let peer: IpAddr = "203.0.113.9".parse().unwrap();
    let headers = HeaderMap::new();

    for _ in 0..6 {
        state
            .limiter
            .check(&Scope::default_scope(), Some(peer), &headers)
            .await;
    }
    assert!(
        !state
            .limiter
            .check(&Scope::default_scope(), Some(peer), &headers)
            .await
            .is_allowed()
    );

    // Two full windows later neither bucket holds old traffic
    clock.advance_secs(20);
    match state
        .limiter
        .check(&Scope::default_scope(), Some(peer), &headers)
        .await
    {
        Admission::Admitted(decision) => assert_eq!(decision.remaining, 4),
        other => panic!("expected admission, got {:?}", other),
    }
}

#[tokio::test]
async fn test_overlap_estimate_keeps_client_denied_early_in_next_bucket() {
    let (state, clock) = common::memory_state(&TestConfig::default());
    let peer: IpAddr = "203.0.113.9".parse().unwrap();
    let headers = HeaderMap::new();
    let scope = Scope::default_scope();

    for _ in 0..5 {
        assert!(state.limiter.check(&scope, Some(peer), &headers).await.is_allowed());
    }

    clock.set_ms(common::T0 + 1_000);
    match state.limiter.check(&scope, Some(peer), &headers).await {
        Admission::Denied(decision) => {
            assert_eq!(decision.estimated_count, 6.0);
            assert_eq!(decision.reset_seconds, 9);
        }
        other => panic!("expected denial, got {:?}", other),
    }

    clock.set_ms(common::T0 + 11_000);
    match state.limiter.check(&scope, Some(peer), &headers).await {
        Admission::Denied(decision) => {
            assert!((decision.estimated_count - 6.4).abs() < 1e-9);
            assert_eq!(decision.remaining, 0);
            assert_eq!(decision.reset_seconds, 9);
        }
        other => panic!("expected denial, got {:?}", other),
    }
}
