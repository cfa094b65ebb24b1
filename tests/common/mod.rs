// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use trainlink::config::Config;
use trainlink::db::FirestoreDb;
use trainlink::models::Role;
use trainlink::routes::create_router;
use trainlink::session::{AuthApi, LoginOutcome, Principal, SessionError};
use trainlink::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project", Duration::from_secs(10))
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with an offline mock store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();

    let state = Arc::new(AppState { config, db });

    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db().await;

    let state = Arc::new(AppState { config, db });

    (create_router(state.clone()), state)
}

#[allow(dead_code)]
pub fn client_principal() -> Principal {
    Principal {
        id: "u1".to_string(),
        username: "alice".to_string(),
        role: Role::Client,
    }
}

#[allow(dead_code)]
pub fn trainer_principal() -> Principal {
    Principal {
        id: "u2".to_string(),
        username: "bob".to_string(),
        role: Role::Trainer,
    }
}

/// Scripted `AuthApi` backend for session cache and guard tests.
///
/// Counts calls; `verify_gate` makes `fetch_principal` wait until
/// notified so tests can hold the cache in `Restoring`.
#[allow(dead_code)]
pub struct MockAuthApi {
    login_outcome: Option<LoginOutcome>,
    login_error: Option<SessionError>,
    principal: Option<Principal>,
    verify_error: Option<SessionError>,
    verify_gate: Option<Arc<Notify>>,
    pub login_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockAuthApi {
    fn base() -> Self {
        Self {
            login_outcome: None,
            login_error: None,
            principal: None,
            verify_error: None,
            verify_gate: None,
            login_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    /// Verification succeeds with the given principal; login succeeds
    /// with a matching outcome.
    pub fn verifying(principal: Principal) -> Self {
        Self {
            login_outcome: Some(LoginOutcome {
                token: format!("token-{}", principal.id),
                user: principal.clone(),
            }),
            principal: Some(principal),
            ..Self::base()
        }
    }

    /// Both login and verification are rejected with the given message.
    pub fn rejecting(msg: &str) -> Self {
        Self {
            login_error: Some(SessionError::Rejected(msg.to_string())),
            verify_error: Some(SessionError::Rejected(msg.to_string())),
            ..Self::base()
        }
    }

    /// Verification is rejected but a fresh login succeeds - the shape
    /// of an expired credential with a still-valid account.
    pub fn reauthenticating(principal: Principal) -> Self {
        Self {
            login_outcome: Some(LoginOutcome {
                token: format!("token-{}", principal.id),
                user: principal,
            }),
            verify_error: Some(SessionError::Rejected("Authorization denied".to_string())),
            ..Self::base()
        }
    }

    /// Login fails at the transport level.
    pub fn unreachable_for_login() -> Self {
        Self {
            login_error: Some(SessionError::Transport("connection refused".to_string())),
            ..Self::base()
        }
    }

    /// Verification succeeds, but only after the gate is notified.
    pub fn gated(principal: Principal, gate: Arc<Notify>) -> Self {
        Self {
            principal: Some(principal.clone()),
            login_outcome: Some(LoginOutcome {
                token: format!("token-{}", principal.id),
                user: principal,
            }),
            verify_gate: Some(gate),
            ..Self::base()
        }
    }

    /// Verification never completes (drives the restore timeout).
    pub fn hanging() -> Self {
        Self {
            verify_gate: Some(Arc::new(Notify::new())),
            ..Self::base()
        }
    }

    pub fn verify_call_count(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl AuthApi for MockAuthApi {
    fn login(
        &self,
        _username: &str,
        _password: &str,
    ) -> impl Future<Output = Result<LoginOutcome, SessionError>> + Send {
        async move {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.login_error {
                return Err(err.clone());
            }
            self.login_outcome
                .clone()
                .ok_or_else(|| SessionError::Rejected("Invalid credentials".to_string()))
        }
    }

    fn fetch_principal(
        &self,
        _token: &str,
    ) -> impl Future<Output = Result<Principal, SessionError>> + Send {
        async move {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.verify_gate {
                gate.notified().await;
            }
            if let Some(err) = &self.verify_error {
                return Err(err.clone());
            }
            self.principal
                .clone()
                .ok_or_else(|| SessionError::Rejected("Authorization denied".to_string()))
        }
    }
}
