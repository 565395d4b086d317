//! Wire Protocol
//!
//! One command or response per line, newline-delimited UTF-8.
//!
//! Client commands after authentication:
//! - `CHAT_HISTORY:<friendId>` — request the full history with a friend
//! - `LOGOUT` — end the session
//! - `<recipientId>:<text>` — any other colon line is an outgoing message
//!
//! History records are serialized as one JSON object per line between the
//! `ChatHistoryStart`/`ChatHistoryEnd` markers, carrying the three logical
//! fields (sender, text, timestamp).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Commands a client may issue once authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Request the ordered message history with a friend.
    History { friend_id: i64 },
    /// Send a message to a recipient.
    Send { recipient_id: i64, text: String },
    /// End the session.
    Logout,
}

/// Why a line failed to parse as a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The line has no colon separator.
    MissingSeparator,
    /// The id portion is not an integer.
    InvalidId,
}

/// Parse one protocol line from an authenticated client.
pub fn parse_command(line: &str) -> Result<ClientCommand, ParseError> {
    let line = line.trim();

    if line == "LOGOUT" {
        return Ok(ClientCommand::Logout);
    }

    if let Some(rest) = line.strip_prefix("CHAT_HISTORY:") {
        let friend_id = rest.trim().parse().map_err(|_| ParseError::InvalidId)?;
        return Ok(ClientCommand::History { friend_id });
    }

    // Any other line: the first colon splits recipient id from text.
    let (id, text) = line.split_once(':').ok_or(ParseError::MissingSeparator)?;
    let recipient_id = id.trim().parse().map_err(|_| ParseError::InvalidId)?;
    Ok(ClientCommand::Send {
        recipient_id,
        text: text.trim().to_string(),
    })
}

// Server reply lines. The exact texts are part of the protocol; clients
// match on them.
pub const LOGIN_UNKNOWN: &str = "Username not found. Connection closed.";
pub const LOGIN_DB_ERROR: &str = "Database error. Connection closed.";
pub const FRIENDS_HEADER: &str = "Friends List:";
pub const FRIENDS_ERROR: &str = "Error retrieving friends list.";
pub const HISTORY_START: &str = "ChatHistoryStart";
pub const HISTORY_END: &str = "ChatHistoryEnd";
pub const HISTORY_ERROR: &str = "Error retrieving chat history.";
pub const INVALID_FORMAT: &str = "Invalid message format.";
pub const PROCESSING_ERROR: &str = "Error processing message.";
pub const SAVE_ERROR: &str = "Error saving message.";
pub const OFFLINE_NOTICE: &str = "Message sent (recipient offline).";
pub const LOGOUT_ACK: &str = "Logged out.";

/// Sender token used in history records for the requesting user's own
/// messages.
pub const SELF_SENDER: &str = "You";

pub fn login_success(username: &str) -> String {
    format!("Login successful! Welcome {}", username)
}

pub fn friend_entry(id: i64, username: &str) -> String {
    format!("{}: {}", id, username)
}

/// Echo to the sender after a live delivery. No space after the colon; the
/// offline echo has one.
pub fn delivered_echo(text: &str) -> String {
    format!("You:{}", text)
}

/// Echo to the sender when the recipient is offline.
pub fn offline_echo(text: &str) -> String {
    format!("You: {}", text)
}

/// One history record, rendered as a single JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// `You` for the requesting user's own messages, else the peer's username.
    pub sender: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
