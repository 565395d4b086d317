//! # Chat Relay Library
//!
//! This crate provides a TCP chat relay server with:
//! - Username-based session authentication
//! - A newline-delimited text protocol over plain TCP
//! - Presence-aware message routing (live delivery or store-only)
//! - PostgreSQL for persistent storage of users, friendships, and messages
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core entities and the persistence gateway traits
//! - **Application Layer**: Presence registry and message routing
//! - **Infrastructure Layer**: Database implementations of the gateway
//! - **Presentation Layer**: TCP listener and per-connection sessions
//!
//! ## Module Structure
//!
//! ```text
//! chat_relay/
//! +-- config/        Configuration management
//! +-- domain/        Domain entities and repository traits
//! +-- application/   Presence registry and router
//! +-- infrastructure/ Database implementations
//! +-- presentation/  TCP listener, sessions, wire protocol
//! +-- shared/        Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Presence and routing
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - TCP listener and protocol
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
