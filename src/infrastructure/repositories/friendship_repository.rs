//! Friendship Repository Implementation
//!
//! PostgreSQL implementation of the FriendshipRepository trait.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{FriendshipRepository, User};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct FriendRow {
    id: i64,
    username: String,
}

/// PostgreSQL friendship repository implementation.
#[derive(Clone)]
pub struct PgFriendshipRepository {
    pool: PgPool,
}

impl PgFriendshipRepository {
    /// Create a new PgFriendshipRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FriendshipRepository for PgFriendshipRepository {
    /// List the outbound friends of a user, ordered by friend id.
    async fn list_friends(&self, user_id: i64) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, FriendRow>(
            r#"
            SELECT users.id, users.username
            FROM user_friends
            JOIN users ON user_friends.friend_id = users.id
            WHERE user_friends.user_id = $1
            ORDER BY users.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| User {
                id: r.id,
                username: r.username,
            })
            .collect())
    }
}
