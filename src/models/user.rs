//! User model for storage and API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two account roles the application distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Trainer,
}

impl Role {
    /// Parse a role from its wire form ("client" / "trainer").
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "client" => Some(Role::Client),
            "trainer" => Some(Role::Trainer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Trainer => "trainer",
        }
    }

    /// The dashboard path a user of this role lands on.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Client => "/client",
            Role::Trainer => "/trainer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account stored in Firestore.
///
/// Documents live in the `users` collection keyed by username, so username
/// uniqueness is enforced by document creation rather than a lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque user id (UUID), the subject of issued credentials
    pub id: String,
    /// Login name (also the document id)
    pub username: String,
    /// Argon2 PHC hash of the password
    pub password_hash: String,
    /// Account role, fixed at registration
    pub role: Role,
    /// When the account was created (RFC 3339)
    pub created_at: String,
}

/// The user shape exposed over the API (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}
