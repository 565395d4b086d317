//! Friendship repository trait.
//!
//! Friendships are a directed `user_id -> friend_id` relation stored in the
//! `user_friends` table. Only the outbound friends of a user are listed;
//! reciprocity is a persistence-layer concern the relay does not enforce.

use async_trait::async_trait;

use super::user::User;
use crate::shared::error::AppError;

/// Repository trait for friendship listings.
#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    /// List the outbound friends of a user as `(id, username)` pairs,
    /// in a stable order.
    async fn list_friends(&self, user_id: i64) -> Result<Vec<User>, AppError>;
}
