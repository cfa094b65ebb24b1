// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes: role-gated upsert and own-profile read.
//!
//! The upsert routes are each gated on the matching role, so the
//! in-handler kind check is a defensive backstop, not the policy.

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::middleware::role::{require_client, require_trainer};
use crate::models::{ClientProfile, Role, TrainerProfile};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

/// Profile routes (mounted behind `require_auth`).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/profiles/client",
            post(upsert_client_profile).route_layer(middleware::from_fn(require_client)),
        )
        .route(
            "/profiles/trainer",
            post(upsert_trainer_profile).route_layer(middleware::from_fn(require_trainer)),
        )
        .route("/profiles/me", get(my_profile))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfilePayload {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(range(min = 1, max = 120, message = "Age must be between 1 and 120"))]
    pub age: u32,
    #[validate(length(min = 1, message = "Gender is required"))]
    pub gender: String,
    #[validate(range(min = 1.0, message = "Weight must be positive"))]
    pub weight: f64,
    #[validate(range(min = 1.0, message = "Height must be positive"))]
    pub height: f64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrainerProfilePayload {
    #[validate(length(min = 1, message = "Bio is required"))]
    pub bio: String,
    #[validate(length(min = 1, message = "At least one specialization is required"))]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub methodology: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

/// Create or update the calling client's profile.
async fn upsert_client_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<ClientProfilePayload>,
) -> Result<Json<ClientProfile>> {
    payload.validate().map_err(AppError::from_validation)?;

    if auth.role != Role::Client {
        return Err(AppError::RoleProfileMismatch);
    }

    let profile = ClientProfile {
        user_id: auth.user_id.clone(),
        full_name: payload.full_name,
        age: payload.age,
        gender: payload.gender,
        weight: payload.weight,
        height: payload.height,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    let stored = state.db.upsert_client_profile(&profile).await?;

    Ok(Json(stored))
}

/// Create or update the calling trainer's profile.
async fn upsert_trainer_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<TrainerProfilePayload>,
) -> Result<Json<TrainerProfile>> {
    payload.validate().map_err(AppError::from_validation)?;

    if auth.role != Role::Trainer {
        return Err(AppError::RoleProfileMismatch);
    }

    let profile = TrainerProfile {
        user_id: auth.user_id.clone(),
        bio: payload.bio,
        specializations: payload.specializations,
        certifications: payload.certifications,
        methodology: payload.methodology,
        availability: payload.availability,
        profile_picture_url: payload.profile_picture_url,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    let stored = state.db.upsert_trainer_profile(&profile).await?;

    Ok(Json(stored))
}

/// Return the caller's own profile with the owning user embedded.
///
/// An absent profile is a 404, distinct from storage faults (5xx); a
/// write has simply not happened yet.
async fn my_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    let user = state
        .db
        .get_user_by_id(&auth.user_id)
        .await?
        .ok_or(AppError::PrincipalNotFound)?;

    let mut body = match auth.role {
        Role::Client => {
            let profile = state
                .db
                .get_client_profile(&auth.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Profile not found for this user".to_string()))?;
            serde_json::to_value(&profile).map_err(|e| AppError::Internal(e.into()))?
        }
        Role::Trainer => {
            let profile = state
                .db
                .get_trainer_profile(&auth.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Profile not found for this user".to_string()))?;
            serde_json::to_value(&profile).map_err(|e| AppError::Internal(e.into()))?
        }
    };

    // Replace the owning-user id with the embedded public fields
    body["user"] = serde_json::json!({
        "username": user.username,
        "role": user.role,
    });

    Ok(Json(body))
}
