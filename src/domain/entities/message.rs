//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Represents a direct message between two users.
///
/// Maps to the `messages` table:
/// - id: BIGSERIAL PRIMARY KEY (creation sequence; history is ordered by it)
/// - sender_id: BIGINT NOT NULL REFERENCES users(id)
/// - receiver_id: BIGINT NOT NULL REFERENCES users(id)
/// - content: TEXT NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// Messages are immutable once created; the relay appends and reads but
/// never edits or deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Primary key and global creation sequence
    pub id: i64,

    /// Sender user ID
    pub sender_id: i64,

    /// Receiver user ID
    pub receiver_id: i64,

    /// Message text
    pub content: String,

    /// Timestamp when the message was created
    pub created_at: DateTime<Utc>,
}

/// Repository trait for Message data access operations.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a new message. Returns the stored message with its assigned
    /// id and timestamp.
    async fn append(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: &str,
    ) -> Result<Message, AppError>;

    /// Fetch every message exchanged between the unordered pair
    /// `{user_a, user_b}`, regardless of direction, ordered by creation
    /// sequence ascending.
    async fn history_between(&self, user_a: i64, user_b: i64) -> Result<Vec<Message>, AppError>;
}
