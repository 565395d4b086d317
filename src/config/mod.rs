//! Configuration Management
//!
//! Layered settings loading: defaults, TOML files, environment variables.

mod settings;

pub use settings::{DatabaseSettings, ServerSettings, Settings};
