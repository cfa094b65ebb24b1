// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navigation guard: one decision per navigation attempt.
//!
//! The guard never races ahead of an in-flight restoration — `decide`
//! awaits the session cache's resolution before emitting anything, so a
//! stale `Empty` can never produce a spurious login redirect.
//!
//! Check order, first failure wins: authentication requirement, then
//! role requirement, then guest-only requirement.

use super::api::AuthApi;
use super::cache::{SessionCache, SessionState};
use super::store::TokenStore;
use crate::models::Role;

/// What a navigation target requires of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    pub path: String,
    pub requires_auth: bool,
    pub required_role: Option<Role>,
    pub guest_only: bool,
}

impl RouteTarget {
    /// A route anyone may visit.
    pub fn public(path: &str) -> Self {
        Self {
            path: path.to_string(),
            requires_auth: false,
            required_role: None,
            guest_only: false,
        }
    }

    /// A route requiring any authenticated session.
    pub fn authenticated(path: &str) -> Self {
        Self {
            path: path.to_string(),
            requires_auth: true,
            required_role: None,
            guest_only: false,
        }
    }

    /// A route requiring a specific role (implies authentication).
    pub fn role_gated(path: &str, role: Role) -> Self {
        Self {
            path: path.to_string(),
            requires_auth: true,
            required_role: Some(role),
            guest_only: false,
        }
    }

    /// A route only guests should see (login, signup).
    pub fn guest_only(path: &str) -> Self {
        Self {
            path: path.to_string(),
            requires_auth: false,
            required_role: None,
            guest_only: true,
        }
    }
}

/// The guard's verdict for one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    RedirectToLogin { return_to: String },
    RedirectToOwnDashboard { path: String },
}

/// Decide a navigation attempt, deferring until the session resolves.
pub async fn decide<A: AuthApi, S: TokenStore>(
    cache: &SessionCache<A, S>,
    target: &RouteTarget,
) -> Decision {
    let state = cache.restore().await;
    decide_resolved(&state, target)
}

/// Decide against an already-resolved session state.
///
/// A `Restoring` state is a caller bug (use `decide`); it is treated as
/// unauthenticated rather than allowed through.
pub fn decide_resolved(state: &SessionState, target: &RouteTarget) -> Decision {
    debug_assert!(
        !matches!(state, SessionState::Restoring),
        "navigation decided against an unresolved session"
    );

    let principal = state.principal();

    if target.requires_auth {
        let Some(principal) = principal else {
            return Decision::RedirectToLogin {
                return_to: target.path.clone(),
            };
        };

        if let Some(required) = target.required_role {
            if principal.role != required {
                let own = principal.role.dashboard_path();
                if target.path == own {
                    // Already on the dashboard we would bounce to
                    return Decision::Allowed;
                }
                return Decision::RedirectToOwnDashboard {
                    path: own.to_string(),
                };
            }
        }
    }

    if target.guest_only {
        if let Some(principal) = principal {
            return Decision::RedirectToOwnDashboard {
                path: principal.role.dashboard_path().to_string(),
            };
        }
    }

    Decision::Allowed
}
