// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role gate: per-route role checks over the authenticated principal.
//!
//! `authorize` is the whole policy — a pure comparison with no I/O.
//! The middleware wrappers apply it per route, after `require_auth` has
//! attached the principal.

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::Role;
use axum::{extract::Request, middleware::Next, response::Response};

/// Check that a principal's role matches the route's required role.
pub fn authorize(role: Role, required: Role) -> Result<(), AppError> {
    if role == required {
        Ok(())
    } else {
        Err(AppError::ForbiddenRole)
    }
}

async fn enforce(required: Role, request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::MissingCredential)?;

    authorize(user.role, required)?;

    Ok(next.run(request).await)
}

/// Middleware requiring the client role.
pub async fn require_client(request: Request, next: Next) -> Result<Response, AppError> {
    enforce(Role::Client, request, next).await
}

/// Middleware requiring the trainer role.
pub async fn require_trainer(request: Request, next: Next) -> Result<Response, AppError> {
    enforce(Role::Trainer, request, next).await
}
