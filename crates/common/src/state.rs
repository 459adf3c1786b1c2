//! Status machine errors
//!
//! Domain crates convert these into their own error enums.

use thiserror::Error;

/// Failure to parse or move a lifecycle status
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Unknown status: {0}")]
    UnknownState(String),
}
