//! API layer for the Waitlist domain
//!
//! Contains HTTP handlers, routes, and domain state definition.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use middleware::{Caller, CallerError, Entrant, WaitlistState};
pub use routes::routes;
