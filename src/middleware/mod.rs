// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, role gating, security headers).

pub mod auth;
pub mod role;
pub mod security;

pub use auth::require_auth;
pub use role::{require_client, require_trainer};
