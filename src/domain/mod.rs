//! # Domain Layer
//!
//! Core entities and the persistence gateway traits. The traits are consumed
//! by the application and presentation layers and implemented in the
//! infrastructure layer, following the dependency inversion principle.

pub mod entities;

pub use entities::{
    FriendshipRepository, Message, MessageRepository, User, UserRepository,
};
