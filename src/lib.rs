// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Trainlink: session & role-gated access for a client/trainer app
//!
//! This crate provides the backend API (credential issuance and
//! verification, role gating, profile storage) and the client-side
//! session toolkit (session cache, navigation guard) that keeps UI
//! navigation consistent with asynchronous session state.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod password;
pub mod routes;
pub mod session;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
}
