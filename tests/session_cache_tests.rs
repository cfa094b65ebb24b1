// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cache lifecycle and single-flight restoration tests.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use trainlink::session::{MemoryTokenStore, SessionCache, SessionError, SessionState, TokenStore};

mod common;
use common::{client_principal, trainer_principal, MockAuthApi};

#[tokio::test]
async fn test_login_persists_credential_and_authenticates() {
    let api = Arc::new(MockAuthApi::verifying(client_principal()));
    let store = Arc::new(MemoryTokenStore::new());
    let cache = SessionCache::new(api.clone(), store.clone());

    let principal = cache.login("alice", "password123").await.unwrap();

    assert_eq!(principal, client_principal());
    assert_eq!(cache.state().await, SessionState::Authenticated(client_principal()));
    assert_eq!(store.load().unwrap(), Some("token-u1".to_string()));
    assert_eq!(cache.token().await, Some("token-u1".to_string()));
}

#[tokio::test]
async fn test_rejected_login_leaves_state_untouched() {
    let api = Arc::new(MockAuthApi::rejecting("Invalid credentials"));
    let store = Arc::new(MemoryTokenStore::new());
    let cache = SessionCache::new(api.clone(), store.clone());

    let err = cache.login("alice", "wrong").await.unwrap_err();

    // The server's message is surfaced verbatim
    match err {
        SessionError::Rejected(msg) => assert_eq!(msg, "Invalid credentials"),
        other => panic!("expected Rejected, got {:?}", other),
    }
    assert_eq!(cache.state().await, SessionState::Empty);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn test_transport_failure_leaves_state_untouched() {
    let api = Arc::new(MockAuthApi::unreachable_for_login());
    let store = Arc::new(MemoryTokenStore::new());
    let cache = SessionCache::new(api.clone(), store.clone());

    let err = cache.login("alice", "password123").await.unwrap_err();

    assert!(matches!(err, SessionError::Transport(_)));
    assert_eq!(cache.state().await, SessionState::Empty);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn test_restore_without_durable_credential_stays_empty() {
    let api = Arc::new(MockAuthApi::verifying(client_principal()));
    let store = Arc::new(MemoryTokenStore::new());
    let cache = SessionCache::new(api.clone(), store.clone());

    assert_eq!(cache.restore().await, SessionState::Empty);

    // No credential, no verification round-trip
    assert_eq!(api.verify_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_restore_revalidates_durable_credential() {
    let api = Arc::new(MockAuthApi::verifying(trainer_principal()));
    let store = Arc::new(MemoryTokenStore::with_token("stored-token"));
    let cache = SessionCache::new(api.clone(), store.clone());

    let state = cache.restore().await;

    assert_eq!(state, SessionState::Authenticated(trainer_principal()));
    assert_eq!(cache.token().await, Some("stored-token".to_string()));
    assert_eq!(api.verify_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_restore_happens_at_most_once() {
    let api = Arc::new(MockAuthApi::verifying(trainer_principal()));
    let store = Arc::new(MemoryTokenStore::with_token("stored-token"));
    let cache = SessionCache::new(api.clone(), store.clone());

    cache.restore().await;
    cache.restore().await;
    cache.restore().await;

    assert_eq!(api.verify_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_restore_clears_durable_storage() {
    let api = Arc::new(MockAuthApi::rejecting("Authorization denied"));
    let store = Arc::new(MemoryTokenStore::with_token("expired-token"));
    let cache = SessionCache::new(api.clone(), store.clone());

    let state = cache.restore().await;

    assert_eq!(state, SessionState::Invalid);
    assert_eq!(store.load().unwrap(), None);
    assert_eq!(cache.token().await, None);
}

#[tokio::test]
async fn test_concurrent_restores_share_one_verification() {
    // Several callers (bootstrap, route guards) race to restore; only
    // the first may issue a verification call, and everyone adopts its
    // outcome.
    let gate = Arc::new(Notify::new());
    let api = Arc::new(MockAuthApi::gated(client_principal(), gate.clone()));
    let store = Arc::new(MemoryTokenStore::with_token("stored-token"));
    let cache = Arc::new(SessionCache::new(api.clone(), store.clone()));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move { cache.restore().await }));
    }

    // Let all three reach the cache; exactly one verification in flight
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(api.verify_calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.state().await, SessionState::Restoring);

    gate.notify_one();

    for handle in handles {
        let state = handle.await.expect("restore task panicked");
        assert_eq!(state, SessionState::Authenticated(client_principal()));
    }

    assert_eq!(api.verify_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stuck_restore_fails_closed() {
    // A verification that never completes must resolve to Invalid after
    // the timeout, never hang (and never silently authenticate).
    let api = Arc::new(MockAuthApi::hanging());
    let store = Arc::new(MemoryTokenStore::with_token("stored-token"));
    let cache = SessionCache::new(api.clone(), store.clone())
        .with_restore_timeout(Duration::from_millis(50));

    let state = cache.restore().await;

    assert_eq!(state, SessionState::Invalid);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn test_logout_clears_everything_unconditionally() {
    let api = Arc::new(MockAuthApi::verifying(client_principal()));
    let store = Arc::new(MemoryTokenStore::new());
    let cache = SessionCache::new(api.clone(), store.clone());

    cache.login("alice", "password123").await.unwrap();
    assert!(cache.state().await.is_authenticated());

    cache.logout().await;

    assert_eq!(cache.state().await, SessionState::Empty);
    assert_eq!(cache.token().await, None);
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn test_login_recovers_an_invalid_session() {
    // An expired credential whose account can still log in fresh.
    let api = Arc::new(MockAuthApi::reauthenticating(client_principal()));
    let store = Arc::new(MemoryTokenStore::with_token("expired-token"));
    let cache = SessionCache::new(api.clone(), store.clone());

    assert_eq!(cache.restore().await, SessionState::Invalid);
    assert_eq!(store.load().unwrap(), None);

    // Fresh credentials bring the same cache back to Authenticated
    cache.login("alice", "password123").await.unwrap();
    assert!(cache.state().await.is_authenticated());
    assert_eq!(store.load().unwrap(), Some("token-u1".to_string()));
}
