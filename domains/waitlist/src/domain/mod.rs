//! Waitlist domain layer: entities, state machine, errors, registration guard

pub mod entities;
pub mod error;
pub mod guard;
pub mod state;
