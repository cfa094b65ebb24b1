// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (account storage, keyed by username)
//! - Client profiles (keyed by owning user id)
//! - Trainer profiles (keyed by owning user id)
//!
//! Profile documents are keyed by the owning user id, so create-or-update
//! is a single conditional write rather than a find-then-decide sequence:
//! concurrent first-time upserts for the same user converge on one
//! document, and a whole-object write can never interleave fields from
//! two callers.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{ClientProfile, TrainerProfile, User};
use std::future::Future;
use std::time::Duration;

const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(10);

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    op_timeout: Duration,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, op_timeout: Duration) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id, op_timeout).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            op_timeout,
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(
        project_id: &str,
        op_timeout: Duration,
    ) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing
        // a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            op_timeout,
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Bound a store operation by the configured timeout.
    ///
    /// Elapsing surfaces as `UpstreamTimeout` so a slow store never hangs
    /// a request (or, downstream, the session cache's restoration).
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| AppError::UpstreamTimeout)?
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create a user account.
    ///
    /// Usernames are document ids, so a duplicate registration fails at
    /// the store instead of racing a lookup.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        self.bounded(async {
            let _: () = self
                .get_client()?
                .fluent()
                .insert()
                .into(collections::USERS)
                .document_id(&user.username)
                .object(user)
                .execute()
                .await
                .map_err(|e| match e {
                    firestore::errors::FirestoreError::DataConflictError(_) => {
                        AppError::Validation("User already exists".to_string())
                    }
                    other => AppError::Database(other.to_string()),
                })?;
            Ok(())
        })
        .await
    }

    /// Get a user by username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.bounded(async {
            self.get_client()?
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(username)
                .await
                .map_err(|e| AppError::Database(e.to_string()))
        })
        .await
    }

    /// Get a user by its opaque id (the credential subject).
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.bounded(async {
            let id = user_id.to_string();
            let users: Vec<User> = self
                .get_client()?
                .fluent()
                .select()
                .from(collections::USERS)
                .filter(move |q| q.field("id").eq(id.clone()))
                .limit(1)
                .obj()
                .query()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            Ok(users.into_iter().next())
        })
        .await
    }

    // ─── Client Profile Operations ───────────────────────────────

    /// Atomically create or replace a client profile.
    ///
    /// Runs as a Firestore transaction: the read registers the document
    /// for conflict detection, `created_at` is carried forward from an
    /// existing document, and the staged write replaces the whole object.
    /// If another request commits first, Firestore retries against the
    /// winner's document, so N concurrent first-time upserts resolve to
    /// exactly one record with one caller's field values.
    pub async fn upsert_client_profile(
        &self,
        profile: &ClientProfile,
    ) -> Result<ClientProfile, AppError> {
        self.bounded(async {
            let client = self.get_client()?;

            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            let existing: Option<ClientProfile> = client
                .fluent()
                .select()
                .by_id_in(collections::CLIENT_PROFILES)
                .obj()
                .one(&profile.user_id)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to read profile in transaction: {}", e))
                })?;

            let mut stored = profile.clone();
            if let Some(existing) = existing {
                // First write wins on creation time
                stored.created_at = existing.created_at;
            }

            client
                .fluent()
                .update()
                .in_col(collections::CLIENT_PROFILES)
                .document_id(&stored.user_id)
                .object(&stored)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add profile to transaction: {}", e))
                })?;

            transaction
                .commit()
                .await
                .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

            tracing::debug!(user_id = %stored.user_id, "Client profile upserted");

            Ok(stored)
        })
        .await
    }

    /// Get a client profile by owning user id.
    pub async fn get_client_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<ClientProfile>, AppError> {
        self.bounded(async {
            self.get_client()?
                .fluent()
                .select()
                .by_id_in(collections::CLIENT_PROFILES)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))
        })
        .await
    }

    // ─── Trainer Profile Operations ──────────────────────────────

    /// Atomically create or replace a trainer profile.
    ///
    /// Same transaction discipline as `upsert_client_profile`.
    pub async fn upsert_trainer_profile(
        &self,
        profile: &TrainerProfile,
    ) -> Result<TrainerProfile, AppError> {
        self.bounded(async {
            let client = self.get_client()?;

            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            let existing: Option<TrainerProfile> = client
                .fluent()
                .select()
                .by_id_in(collections::TRAINER_PROFILES)
                .obj()
                .one(&profile.user_id)
                .await
                .map_err(|e| {
                    AppError::Database(format!("Failed to read profile in transaction: {}", e))
                })?;

            let mut stored = profile.clone();
            if let Some(existing) = existing {
                // First write wins on creation time
                stored.created_at = existing.created_at;
            }

            client
                .fluent()
                .update()
                .in_col(collections::TRAINER_PROFILES)
                .document_id(&stored.user_id)
                .object(&stored)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add profile to transaction: {}", e))
                })?;

            transaction
                .commit()
                .await
                .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

            tracing::debug!(user_id = %stored.user_id, "Trainer profile upserted");

            Ok(stored)
        })
        .await
    }

    /// Get a trainer profile by owning user id.
    pub async fn get_trainer_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<TrainerProfile>, AppError> {
        self.bounded(async {
            self.get_client()?
                .fluent()
                .select()
                .by_id_in(collections::TRAINER_PROFILES)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))
        })
        .await
    }
}
