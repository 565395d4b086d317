//! Message Router
//!
//! Stateless routing logic invoked by a session to deliver an outgoing
//! message: persist it unconditionally, then deliver to the recipient's live
//! session if one is registered. Persistence and delivery outcomes are
//! reported independently — a failed append does not suppress the delivery
//! attempt.

use std::sync::Arc;

use crate::application::presence::PresenceRegistry;
use crate::domain::MessageRepository;

/// What happened to a routed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOutcome {
    /// The message was durably appended.
    pub persisted: bool,
    /// The message reached a live recipient session.
    pub delivered: bool,
}

/// Routes outgoing messages to storage and to live recipients.
#[derive(Clone)]
pub struct MessageRouter {
    messages: Arc<dyn MessageRepository>,
    registry: Arc<PresenceRegistry>,
}

impl MessageRouter {
    pub fn new(messages: Arc<dyn MessageRepository>, registry: Arc<PresenceRegistry>) -> Self {
        Self { messages, registry }
    }

    /// Route a message from `sender` to `recipient_id`.
    ///
    /// The recipient, when online, receives `<sender_username>: <text>` on
    /// its outbound stream. A recipient whose writer has already shut down
    /// counts as offline.
    pub async fn route(
        &self,
        sender_id: i64,
        sender_username: &str,
        recipient_id: i64,
        text: &str,
    ) -> RouteOutcome {
        let persisted = match self.messages.append(sender_id, recipient_id, text).await {
            Ok(message) => {
                tracing::debug!(
                    message_id = message.id,
                    sender_id,
                    recipient_id,
                    "Message persisted"
                );
                true
            }
            Err(e) => {
                tracing::error!(sender_id, recipient_id, error = %e, "Failed to persist message");
                false
            }
        };

        let delivered = match self.registry.find_by_user_id(recipient_id) {
            Some(recipient) => recipient.send(format!("{}: {}", sender_username, text)),
            None => false,
        };

        RouteOutcome {
            persisted,
            delivered,
        }
    }
}
