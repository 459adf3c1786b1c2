//! Route definitions for Waitlist domain API

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{entries, lottery, notifications};
use super::middleware::WaitlistState;

/// Create event waitlist routes
fn event_routes() -> Router<WaitlistState> {
    Router::new()
        .route(
            "/v1/events/{event_id}/waitlist",
            get(entries::list_event_entries)
                .post(entries::join)
                .delete(entries::leave),
        )
        .route("/v1/events/{event_id}/waitlist/me", get(entries::my_entry))
        .route(
            "/v1/events/{event_id}/waitlist/summary",
            get(entries::summary),
        )
        .route("/v1/events/{event_id}/lottery", post(lottery::draw))
        .route(
            "/v1/events/{event_id}/notifications",
            post(notifications::broadcast),
        )
}

/// Create entry administration and invitation routes
fn entry_routes() -> Router<WaitlistState> {
    Router::new()
        .route("/v1/waitlist/{entry_id}/respond", post(entries::respond))
        .route("/v1/waitlist/{entry_id}/cancel", post(entries::cancel))
        .route(
            "/v1/waitlist/{entry_id}/reinstate",
            post(entries::reinstate),
        )
}

/// Create routes about the caller
fn me_routes() -> Router<WaitlistState> {
    Router::new()
        .route("/v1/me/waitlist", get(entries::my_waitlist))
        .route(
            "/v1/me/notifications",
            get(notifications::list_my_notifications),
        )
        .route(
            "/v1/me/notifications/{notification_id}",
            delete(notifications::delete_my_notification),
        )
}

/// Create all Waitlist domain API routes
pub fn routes() -> Router<WaitlistState> {
    Router::new()
        .merge(event_routes())
        .merge(entry_routes())
        .merge(me_routes())
}
