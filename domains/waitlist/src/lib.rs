//! Waitlist domain: entry lifecycle, lottery draw, invitation responses

pub mod api;
pub mod domain;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::error::{Result, WaitlistError};
pub use domain::guard::{CapacityPolicy, RegistrationGuard};
pub use domain::state::{StateError, WaitlistStateMachine, WaitlistStatus};
// Re-export repository types
pub use repository::{EventRepository, UserRepository, WaitlistRepositories, WaitlistRepository};
// Re-export service types
pub use service::{DrawFailure, DrawOutcome, InvitationDecision, WaitlistService};

// Re-export API types
pub use api::routes;
pub use api::WaitlistState;
