//! # Domain Entities
//!
//! Entities map directly to their corresponding database tables.
//!
//! - **User**: an account known to the relay; usernames are the external
//!   handle, ids key all friend and message references
//! - **Friendship**: directed `user_id -> friend_id` relation
//! - **Message**: an immutable direct message between two users
//!
//! Each entity has an associated repository trait defining data access
//! operations — together these traits form the persistence gateway the
//! session engine calls.

mod friendship;
mod message;
mod user;

// Re-export User entity and related types
pub use user::{User, UserRepository};

// Re-export the Friendship repository trait
pub use friendship::FriendshipRepository;

// Re-export Message entity and related types
pub use message::{Message, MessageRepository};
