// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP backend for the session cache.
//!
//! `AuthApi` is the seam the cache talks through; `ApiClient` is the
//! reqwest-backed implementation, and tests substitute scripted mocks.

use crate::middleware::auth::AUTH_HEADER;
use crate::models::Role;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Errors surfaced by the session layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The server rejected the request; the message is rendered verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Transport-level failure; the session state is left unchanged.
    #[error("Request failed, please try again")]
    Transport(String),

    /// The bounded operation did not complete in time.
    #[error("Request timed out, please try again")]
    Timeout,

    /// Durable token storage failed.
    #[error("Session storage error: {0}")]
    Storage(String),
}

/// The authenticated principal as the API reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Principal {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub role: Role,
}

/// Successful issuance: the raw credential plus its principal.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: Principal,
}

/// The verification backend the session cache depends on.
///
/// Futures are `Send` so cache operations can be driven from spawned
/// tasks.
pub trait AuthApi: Send + Sync {
    /// Exchange a username/password pair for a credential.
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginOutcome, SessionError>> + Send;

    /// Revalidate a stored credential and resolve its principal.
    fn fetch_principal(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Principal, SessionError>> + Send;
}

/// A shared backend is still a backend.
impl<T: AuthApi> AuthApi for std::sync::Arc<T> {
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginOutcome, SessionError>> + Send {
        (**self).login(username, password)
    }

    fn fetch_principal(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Principal, SessionError>> + Send {
        (**self).fetch_principal(token)
    }
}

/// Reqwest-backed API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    errors: Vec<ErrorMessage>,
}

#[derive(Deserialize)]
struct ErrorMessage {
    msg: String,
}

impl ApiClient {
    /// Create a client against the given API base URL.
    ///
    /// The timeout bounds every request; an elapsed request surfaces as
    /// `SessionError::Timeout` rather than hanging the caller.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Register a new account; same response shape as login.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<LoginOutcome, SessionError> {
        let response = self
            .http
            .post(format!("{}/auth/register", self.base_url))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
                "role": role.as_str(),
            }))
            .send()
            .await
            .map_err(map_transport)?;

        Self::parse_issuance(response).await
    }

    async fn parse_issuance(response: reqwest::Response) -> Result<LoginOutcome, SessionError> {
        let status = response.status();
        if status.is_success() {
            response.json::<LoginOutcome>().await.map_err(map_transport)
        } else if status.is_client_error() {
            Err(SessionError::Rejected(first_error_message(response).await))
        } else {
            Err(SessionError::Transport(format!("server returned {}", status)))
        }
    }
}

impl AuthApi for ApiClient {
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginOutcome, SessionError>> + Send {
        async move {
            let response = self
                .http
                .post(format!("{}/auth/login", self.base_url))
                .json(&serde_json::json!({
                    "username": username,
                    "password": password,
                }))
                .send()
                .await
                .map_err(map_transport)?;

            Self::parse_issuance(response).await
        }
    }

    fn fetch_principal(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Principal, SessionError>> + Send {
        async move {
            let response = self
                .http
                .get(format!("{}/auth", self.base_url))
                .header(AUTH_HEADER, token)
                .send()
                .await
                .map_err(map_transport)?;

            let status = response.status();
            if status.is_success() {
                response.json::<Principal>().await.map_err(map_transport)
            } else if status.is_client_error() {
                Err(SessionError::Rejected(first_error_message(response).await))
            } else {
                Err(SessionError::Transport(format!("server returned {}", status)))
            }
        }
    }
}

fn map_transport(err: reqwest::Error) -> SessionError {
    if err.is_timeout() {
        SessionError::Timeout
    } else {
        SessionError::Transport(err.to_string())
    }
}

/// Pull the first server-provided message out of an error body.
async fn first_error_message(response: reqwest::Response) -> String {
    response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.errors.into_iter().next())
        .map(|e| e.msg)
        .unwrap_or_else(|| "Request failed, please try again".to_string())
}
