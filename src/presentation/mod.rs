//! # Presentation Layer
//!
//! The TCP wire surface: listener, per-connection sessions, and the
//! line-delimited protocol.

pub mod tcp;
