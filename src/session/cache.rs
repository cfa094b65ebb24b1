// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-wide session cache with single-flight restoration.
//!
//! The cache is the one owner of the credential on the client side. Its
//! lifecycle is four named states; every transition below is the only
//! way to enter its target state:
//!
//! - `Empty`: nothing held, nothing durable.
//! - `Restoring`: a durable credential exists and one revalidation call
//!   is in flight.
//! - `Authenticated`: principal held, credential confirmed as of the
//!   last revalidation.
//! - `Invalid`: revalidation failed; durable storage has been cleared.
//!
//! Restoration is single-flight: an async mutex serializes callers and
//! a post-acquire state re-check hands every waiter the first caller's
//! outcome, so the process never issues more than one concurrent
//! verification call no matter how many guards and bootstraps await it.

use super::api::{AuthApi, Principal, SessionError};
use super::store::TokenStore;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

const DEFAULT_RESTORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Observable session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Restoring,
    Authenticated(Principal),
    Invalid,
}

impl SessionState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionState::Authenticated(principal) => Some(principal),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Process-wide session cache.
pub struct SessionCache<A, S> {
    api: A,
    store: S,
    state: RwLock<SessionState>,
    /// The raw credential backing `Authenticated`, attached to API calls
    token: RwLock<Option<String>>,
    /// Serializes restoration; waiters adopt the first caller's outcome
    restore_lock: Mutex<()>,
    restore_timeout: Duration,
}

impl<A: AuthApi, S: TokenStore> SessionCache<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            store,
            state: RwLock::new(SessionState::Empty),
            token: RwLock::new(None),
            restore_lock: Mutex::new(()),
            restore_timeout: DEFAULT_RESTORE_TIMEOUT,
        }
    }

    /// Override the restoration timeout (fails closed on elapse).
    pub fn with_restore_timeout(mut self, timeout: Duration) -> Self {
        self.restore_timeout = timeout;
        self
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// The raw credential, for attaching to subsequent API requests.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Issue a credential and enter `Authenticated`.
    ///
    /// On any failure the state is left exactly as it was: a rejected
    /// login surfaces the server's message, a transport failure the
    /// generic retry message, and neither produces a partial login.
    pub async fn login(&self, username: &str, password: &str) -> Result<Principal, SessionError> {
        let outcome = self.api.login(username, password).await?;

        self.store.save(&outcome.token)?;

        let mut state = self.state.write().await;
        let mut token = self.token.write().await;
        *token = Some(outcome.token.clone());
        *state = SessionState::Authenticated(outcome.user.clone());

        Ok(outcome.user)
    }

    /// Drop the session unconditionally: memory and durable storage are
    /// cleared even if nothing else succeeds. No network call.
    pub async fn logout(&self) {
        let mut state = self.state.write().await;
        let mut token = self.token.write().await;
        *token = None;
        *state = SessionState::Empty;

        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear durable session storage");
        }
    }

    /// Revalidate the durable credential, resolving to a terminal state.
    ///
    /// Idempotent and single-flight: the first caller performs at most
    /// one verification round-trip; concurrent callers block on the
    /// restore lock and return the first caller's outcome. A resolved
    /// session (authenticated, invalid, or known-empty) returns without
    /// any I/O. Verification failure or timeout fails closed: durable
    /// storage is cleared and the state becomes `Invalid`.
    pub async fn restore(&self) -> SessionState {
        // Fast path: a resolved session never re-verifies.
        {
            let state = self.state.read().await;
            if !matches!(*state, SessionState::Empty | SessionState::Restoring) {
                return state.clone();
            }
        }

        let _guard = self.restore_lock.lock().await;

        // Re-check after the lock: another caller may have resolved the
        // session while we waited.
        {
            let state = self.state.read().await;
            match &*state {
                SessionState::Empty | SessionState::Restoring => {}
                resolved => return resolved.clone(),
            }
        }

        let stored = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                // Nothing durable: resolve to Empty without any network call.
                *self.state.write().await = SessionState::Empty;
                return SessionState::Empty;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read durable session storage");
                *self.state.write().await = SessionState::Empty;
                return SessionState::Empty;
            }
        };

        *self.state.write().await = SessionState::Restoring;

        let verified = tokio::time::timeout(
            self.restore_timeout,
            self.api.fetch_principal(&stored),
        )
        .await;

        let next = match verified {
            Ok(Ok(principal)) => SessionState::Authenticated(principal),
            Ok(Err(err)) => {
                tracing::info!(error = %err, "Stored credential failed revalidation");
                SessionState::Invalid
            }
            Err(_) => {
                tracing::warn!("Session restoration timed out, failing closed");
                SessionState::Invalid
            }
        };

        let mut state = self.state.write().await;
        if !matches!(*state, SessionState::Restoring) {
            // A login completed while we were verifying; its session wins.
            return state.clone();
        }

        let mut token = self.token.write().await;
        match &next {
            SessionState::Authenticated(_) => {
                *token = Some(stored);
            }
            _ => {
                *token = None;
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "Failed to clear durable session storage");
                }
            }
        }
        *state = next.clone();

        next
    }
}
