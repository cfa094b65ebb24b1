//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// User accounts, keyed by username
    pub const USERS: &str = "users";
    /// Client profiles, keyed by owning user id
    pub const CLIENT_PROFILES: &str = "client_profiles";
    /// Trainer profiles, keyed by owning user id
    pub const TRAINER_PROFILES: &str = "trainer_profiles";
}
