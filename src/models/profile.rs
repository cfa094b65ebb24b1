// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile models for the two account roles.
//!
//! Each user owns at most one profile, of the kind matching its role.
//! Profile documents are keyed by the owning user id, which is what makes
//! create-or-update a single atomic write instead of a find-then-decide
//! sequence.

use serde::{Deserialize, Serialize};

/// Client profile stored in Firestore (`client_profiles/{user_id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientProfile {
    /// Owning user id (also the document id)
    #[serde(rename = "user")]
    pub user_id: String,
    pub full_name: String,
    pub age: u32,
    pub gender: String,
    /// Weight in kilograms
    pub weight: f64,
    /// Height in centimeters
    pub height: f64,
    /// Set on first creation, preserved across updates (RFC 3339)
    pub created_at: String,
}

/// Trainer profile stored in Firestore (`trainer_profiles/{user_id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerProfile {
    /// Owning user id (also the document id)
    #[serde(rename = "user")]
    pub user_id: String,
    pub bio: String,
    pub specializations: Vec<String>,
    pub certifications: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    /// Set on first creation, preserved across updates (RFC 3339)
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_profile_wire_names() {
        let profile = ClientProfile {
            user_id: "u1".to_string(),
            full_name: "A".to_string(),
            age: 30,
            gender: "f".to_string(),
            weight: 60.0,
            height: 165.0,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["user"], "u1");
        assert_eq!(json["fullName"], "A");
        assert_eq!(json["age"], 30);
        assert_eq!(json["createdAt"], "2026-01-01T00:00:00Z");
    }

    #[test]
    fn test_trainer_profile_optional_fields_omitted() {
        let profile = TrainerProfile {
            user_id: "u2".to_string(),
            bio: "Strength coach".to_string(),
            specializations: vec!["strength".to_string()],
            certifications: vec![],
            methodology: None,
            availability: None,
            profile_picture_url: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("methodology").is_none());
        assert!(json.get("availability").is_none());
        assert!(json.get("profilePictureUrl").is_none());
    }
}
