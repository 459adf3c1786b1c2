//! HTTP handlers for the Waitlist domain

pub mod entries;
pub mod lottery;
pub mod notifications;

use super::error::{ApiError, ApiResult};
use super::middleware::WaitlistState;
use crate::domain::entities::{Event, User};

/// Load an event the caller organizes, or any event for an administrator
pub(crate) async fn managed_event(
    state: &WaitlistState,
    user: &User,
    event_id: &str,
) -> ApiResult<Event> {
    let event = state.service.event(event_id).await?;
    if !user.manages(&event) {
        return Err(ApiError::forbidden(
            "Access denied: Only the event's organizer can do this",
        ));
    }
    Ok(event)
}
