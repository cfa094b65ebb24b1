// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer credential verification middleware.
//!
//! The credential is an HS256 JWT carried in the `x-auth-token` header.
//! Verification is purely cryptographic plus an expiry check; no session
//! record exists server-side.

use crate::error::AppError;
use crate::models::Role;
use crate::time_utils::unix_now_secs;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Header carrying the raw credential on every protected request.
pub const AUTH_HEADER: &str = "x-auth-token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (opaque user id)
    pub sub: String,
    /// Account role, read from storage at issuance time
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated principal extracted from a verified credential.
///
/// Reconstructed solely from the claims; handlers that need the username
/// re-fetch the user and treat a missing account as `PrincipalNotFound`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

/// Middleware that requires a valid bearer credential.
///
/// Runs before any role gate; the `AuthUser` it attaches is what the
/// gate and the handlers consume.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::MissingCredential)?;

    let claims = decode_token(token, &state.config.jwt_signing_key)?;

    let auth_user = AuthUser {
        user_id: claims.sub,
        role: claims.role,
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Validate a raw credential and return its claims.
///
/// Expiry is reported distinctly so logs can tell the cases apart; the
/// HTTP response renders both as the same 401.
pub fn decode_token(token: &str, signing_key: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::ExpiredCredential,
            _ => AppError::InvalidCredential,
        })
}

/// Create a credential for a user session.
///
/// The role is always taken from the stored account, never from request
/// input, so a registration payload cannot inject privileges.
pub fn create_jwt(
    user_id: &str,
    role: Role,
    signing_key: &[u8],
    ttl_secs: u64,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = unix_now_secs()?;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        iat: now,
        exp: now + ttl_secs as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
