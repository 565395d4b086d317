//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Represents a user account known to the relay.
///
/// Maps to the `users` table:
/// - id: BIGSERIAL PRIMARY KEY
/// - username: VARCHAR(32) NOT NULL UNIQUE
///
/// The relay only ever reads users; account creation and management belong
/// to the persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal id (primary key), used in all friend/message references
    pub id: i64,

    /// Username (unique) — the external handle clients authenticate with
    pub username: String,
}

/// Repository trait for User lookups.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their internal ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
}
