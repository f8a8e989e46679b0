//! User model for authentication.
//!
//! Users authenticate with an API key. Only the SHA-256 hash of the key is stored.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents a user record.
///
/// # Database Table
///
/// Maps to the `users` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `key_hash`: SHA-256 hash of the user's API key
/// - `display_name`: Human-readable name
/// - `created_at`: When the user was registered
/// - `is_active`: Whether the key is currently accepted
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// SHA-256 hash of the actual API key (64 hex characters)
    ///
    /// When a request comes in with "Bearer abc123", we:
    /// 1. Hash "abc123" with SHA-256
    /// 2. Look up this hash in the store
    /// 3. If found and active, authenticate the request
    pub key_hash: String,

    pub display_name: String,

    pub created_at: DateTime<Utc>,

    /// Inactive users are rejected during authentication. This revokes access
    /// without deleting their data.
    pub is_active: bool,
}

impl User {
    pub fn new(display_name: String, key_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            key_hash,
            display_name,
            created_at: Utc::now(),
            is_active: true,
        }
    }
}
