//! Failure injection tests: retry policy, breaker transitions, error kinds.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ai_gateway::config::GatewayConfig;
use ai_gateway::error::GatewayError;
use ai_gateway::upstream::inference::GenerateRequest;
use ai_gateway::Gateway;

mod common;

fn generate_req() -> GenerateRequest {
    GenerateRequest {
        model: "llama3".into(),
        prompt: "hello".into(),
        stream: false,
        options: None,
    }
}

fn config_for(addr: std::net::SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.inference.base_url = format!("http://{addr}");
    config.retries.backoff_ms = 30;
    config
}

#[tokio::test]
async fn test_transient_status_retries_then_fails_unavailable() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_upstream(move |_req| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (503, r#"{"error":"overloaded"}"#.to_string())
        }
    })
    .await;

    let mut config = config_for(addr);
    config.retries.max_retries = 2;
    let gateway = Gateway::new(config).unwrap();

    let started = Instant::now();
    let err = gateway.generate(&generate_req()).await.unwrap_err();

    assert!(matches!(err, GatewayError::UpstreamUnavailable { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 3, "retries=2 means 3 attempts");
    // Linear backoff slept 30ms then 60ms between attempts, none after the last.
    assert!(started.elapsed() >= Duration::from_millis(90));
}

#[tokio::test]
async fn test_transient_exhaustion_counts_once_against_breaker() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_upstream(move |_req| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (503, String::new())
        }
    })
    .await;

    let mut config = config_for(addr);
    config.retries.max_retries = 1;
    config.breaker.failure_threshold = 1;
    let gateway = Gateway::new(config).unwrap();

    // Two transient attempts, then one terminal failure report opens the
    // breaker (threshold 1).
    let err = gateway.generate(&generate_req()).await.unwrap_err();
    assert!(matches!(err, GatewayError::UpstreamUnavailable { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Rejected without any further I/O.
    let err = gateway.generate(&generate_req()).await.unwrap_err();
    assert!(err.retry_after().is_some(), "breaker rejection carries cooldown");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unexpected_status_fails_fast() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_upstream(move |_req| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (400, r#"{"error":"model not found"}"#.to_string())
        }
    })
    .await;

    let mut config = config_for(addr);
    config.retries.max_retries = 2;
    let gateway = Gateway::new(config).unwrap();

    let err = gateway.generate(&generate_req()).await.unwrap_err();
    match err {
        GatewayError::BadUpstreamResponse {
            status, snippet, ..
        } => {
            assert_eq!(status, 400);
            assert!(snippet.contains("model not found"));
        }
        other => panic!("expected bad upstream response, got {other}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1, "no retry on 400");
}

#[tokio::test]
async fn test_error_snippet_truncated_to_512_chars() {
    let addr = common::start_upstream(|_req| async { (400, "x".repeat(2000)) }).await;

    let gateway = Gateway::new(config_for(addr)).unwrap();
    let err = gateway.generate(&generate_req()).await.unwrap_err();
    match err {
        GatewayError::BadUpstreamResponse { snippet, .. } => {
            assert_eq!(snippet.chars().count(), 512);
        }
        other => panic!("expected bad upstream response, got {other}"),
    }
}

#[tokio::test]
async fn test_breaker_opens_after_consecutive_failures() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_upstream(move |_req| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (400, String::new())
        }
    })
    .await;

    let mut config = config_for(addr);
    config.breaker.failure_threshold = 2;
    let gateway = Gateway::new(config).unwrap();

    for _ in 0..2 {
        let err = gateway.generate(&generate_req()).await.unwrap_err();
        assert!(matches!(err, GatewayError::BadUpstreamResponse { .. }));
    }

    // Threshold hit: the next call is rejected before any network attempt.
    let err = gateway.generate(&generate_req()).await.unwrap_err();
    assert!(matches!(err, GatewayError::UpstreamUnavailable { .. }));
    let remaining = err.retry_after().expect("open breaker carries cooldown");
    assert!(remaining <= Duration::from_secs(10));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_breaker_closes_after_cooldown() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_upstream(move |_req| {
        let counter = counter.clone();
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                (400, String::new())
            } else {
                (200, r#"{"response":"back"}"#.to_string())
            }
        }
    })
    .await;

    let mut config = config_for(addr);
    config.breaker.failure_threshold = 1;
    config.breaker.cooldown_secs = 0.3;
    let gateway = Gateway::new(config).unwrap();

    // Opens on the first failure…
    assert!(gateway.generate(&generate_req()).await.is_err());
    // …rejects while open, without I/O…
    let err = gateway.generate(&generate_req()).await.unwrap_err();
    assert!(err.retry_after().is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // …and the first check after the cooldown goes straight through.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let res = gateway.generate(&generate_req()).await.unwrap();
    assert_eq!(res.response, "back");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_success_resets_failure_counter() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_upstream(move |_req| {
        let counter = counter.clone();
        async move {
            // fail, succeed, fail, fail
            match counter.fetch_add(1, Ordering::SeqCst) {
                1 => (200, r#"{"response":"ok"}"#.to_string()),
                _ => (400, String::new()),
            }
        }
    })
    .await;

    let mut config = config_for(addr);
    config.breaker.failure_threshold = 2;
    let gateway = Gateway::new(config).unwrap();

    assert!(gateway.generate(&generate_req()).await.is_err()); // 1 failure
    assert!(gateway.generate(&generate_req()).await.is_ok()); // reset
    assert!(gateway.generate(&generate_req()).await.is_err()); // 1 failure
    assert!(gateway.generate(&generate_req()).await.is_err()); // 2nd → opens

    let err = gateway.generate(&generate_req()).await.unwrap_err();
    assert!(err.retry_after().is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_timeout_classified_and_reported_per_attempt() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = common::start_upstream(move |_req| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(1500)).await;
            (200, r#"{"response":"too late"}"#.to_string())
        }
    })
    .await;

    let mut config = config_for(addr);
    config.timeouts.request_secs = 0.5;
    config.retries.max_retries = 0;
    config.breaker.failure_threshold = 1;
    let gateway = Gateway::new(config).unwrap();

    let err = gateway.generate(&generate_req()).await.unwrap_err();
    assert!(matches!(err, GatewayError::UpstreamTimeout { .. }));

    // The timeout was reported on its attempt; the breaker is already open.
    let err = gateway.generate(&generate_req()).await.unwrap_err();
    assert!(err.retry_after().is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_connection_error_is_unavailable() {
    // Grab an ephemeral port and close it again: connections get refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = config_for(addr);
    config.retries.max_retries = 0;
    let gateway = Gateway::new(config).unwrap();

    let err = gateway.generate(&generate_req()).await.unwrap_err();
    match err {
        GatewayError::UpstreamUnavailable { retry_after, .. } => {
            assert_eq!(retry_after, None, "not a breaker rejection");
        }
        other => panic!("expected unavailable, got {other}"),
    }
}
