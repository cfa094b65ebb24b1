// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential issuance routes: register, login, current principal.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::{PublicUser, Role, User};
use crate::time_utils::format_utc_rfc3339;
use crate::{password, AppState};

/// Public issuance routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Routes that require a verified credential (mounted behind `require_auth`).
pub fn me_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 3, max = 32, message = "Username must be 3 to 32 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Parsed manually so the error lands in the standard error body
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

/// Successful issuance response: the credential plus the public user.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Register a new account and issue a credential for it.
///
/// The stored role comes from the validated payload exactly once, here;
/// every later request gets its role from the credential, so nothing a
/// client sends afterwards can change it.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<AuthResponse>> {
    payload.validate().map_err(AppError::from_validation)?;

    let role = Role::parse(&payload.role).ok_or_else(|| {
        AppError::Validation("Role must be either 'client' or 'trainer'".to_string())
    })?;

    let password_hash = password::hash(&payload.password)?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: payload.username,
        password_hash,
        role,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    // Fails with a conflict if the username is taken; no lookup race.
    state.db.create_user(&user).await?;

    tracing::info!(username = %user.username, role = %user.role, "User registered");

    let token = create_jwt(
        &user.id,
        user.role,
        &state.config.jwt_signing_key,
        state.config.token_ttl_secs,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Verify a username/password pair and issue a credential.
///
/// Unknown usernames and wrong passwords produce the identical error so
/// responses cannot be used to enumerate accounts.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>> {
    let user = state
        .db
        .get_user_by_username(&payload.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !password::verify(&user.password_hash, &payload.password) {
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!(username = %user.username, "User logged in");

    let token = create_jwt(
        &user.id,
        user.role,
        &state.config.jwt_signing_key,
        state.config.token_ttl_secs,
    )?;

    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

/// Return the current principal, re-fetched from storage.
///
/// The re-fetch catches accounts deleted after issuance; the resulting
/// 401 is indistinguishable from any other verification failure.
async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PublicUser>> {
    let user = state
        .db
        .get_user_by_id(&auth.user_id)
        .await?
        .ok_or(AppError::PrincipalNotFound)?;

    Ok(Json(PublicUser::from(&user)))
}
