//! Shared utilities, configuration, and error handling for Konoha Events
//!
//! This crate provides common functionality used across the workspace:
//! - Configuration management following 12-factor principles
//! - Request-level error type and its HTTP mapping
//! - State machine error shared by domain crates
//! - Request extractors (validated JSON, pagination)

pub mod config;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::{CapacityPolicySetting, Config, LogFormat};
pub use error::Error;
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;
