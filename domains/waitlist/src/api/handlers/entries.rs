//! Waitlist entry API handlers
//!
//! Entrants join, leave and answer invitations. Organizers (and administrators)
//! inspect and administer the entries of the events they manage.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use konoha_common::Pagination;
use serde::{Deserialize, Serialize};

use super::managed_event;
use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::{Caller, Entrant, WaitlistState};
use crate::domain::entities::{WaitlistEntry, WaitlistSummary};
use crate::domain::error::WaitlistError;
use crate::domain::state::WaitlistStatus;
use crate::service::InvitationDecision;

/// Waitlist entry as returned by the API
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub status: WaitlistStatus,
}

impl From<WaitlistEntry> for EntryResponse {
    fn from(entry: WaitlistEntry) -> Self {
        Self {
            id: entry.id,
            event_id: entry.event_id,
            user_id: entry.user_id,
            status: entry.status,
        }
    }
}

/// Query parameters for listing an event's entries
#[derive(Debug, Deserialize, Default)]
pub struct StatusFilter {
    /// Only entries in this status (WAITING, SELECTED, ...)
    pub status: Option<WaitlistStatus>,
}

/// Request for answering an invitation
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub decision: InvitationDecision,
}

/// Join an event's waitlist
///
/// **POST /v1/events/{event_id}/waitlist**
pub async fn join(
    Entrant(user): Entrant,
    State(state): State<WaitlistState>,
    Path(event_id): Path<String>,
) -> ApiResult<(StatusCode, Json<EntryResponse>)> {
    let entry = state.service.join(&event_id, &user.id).await?;

    tracing::info!(event_id = %event_id, user_id = %user.id, entry_id = %entry.id, "Joined waitlist");
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Leave an event's waitlist
///
/// **DELETE /v1/events/{event_id}/waitlist**
///
/// Only possible while the entry is still waiting.
pub async fn leave(
    Entrant(user): Entrant,
    State(state): State<WaitlistState>,
    Path(event_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.leave(&event_id, &user.id).await?;

    tracing::info!(event_id = %event_id, user_id = %user.id, "Left waitlist");
    Ok(StatusCode::NO_CONTENT)
}

/// Get the caller's own entry for an event
///
/// **GET /v1/events/{event_id}/waitlist/me**
pub async fn my_entry(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state
        .service
        .find(&event_id, &user.id)
        .await?
        .ok_or_else(|| WaitlistError::NotFound("Waitlist entry".to_string()))?;

    Ok(Json(entry.into()))
}

/// List an event's entries, optionally by status
///
/// **GET /v1/events/{event_id}/waitlist?status=&offset=&limit=**
pub async fn list_event_entries(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
    Path(event_id): Path<String>,
    Query(filter): Query<StatusFilter>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<EntryResponse>>> {
    managed_event(&state, &user, &event_id).await?;

    let entries = match filter.status {
        Some(status) => {
            state
                .service
                .list_by_event_with_status(&event_id, status)
                .await?
        }
        None => state.service.list_by_event(&event_id).await?,
    };

    Ok(Json(
        page.apply(entries).into_iter().map(Into::into).collect(),
    ))
}

/// Count an event's entries per status
///
/// **GET /v1/events/{event_id}/waitlist/summary**
pub async fn summary(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<WaitlistSummary>> {
    managed_event(&state, &user, &event_id).await?;
    Ok(Json(state.service.summarize(&event_id).await?))
}

/// List the caller's entries across events
///
/// **GET /v1/me/waitlist**
pub async fn my_waitlist(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
) -> ApiResult<Json<Vec<EntryResponse>>> {
    let entries = state.service.list_by_user(&user.id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Accept or decline a lottery invitation
///
/// **POST /v1/waitlist/{entry_id}/respond**
pub async fn respond(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
    Path(entry_id): Path<String>,
    Json(request): Json<RespondRequest>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state.service.get_entry(&entry_id).await?;
    if entry.user_id != user.id {
        return Err(ApiError::forbidden(
            "Access denied: Only the invited entrant can respond",
        ));
    }

    let updated = state.service.respond(&entry_id, request.decision).await?;
    Ok(Json(updated.into()))
}

/// Cancel an entrant's place
///
/// **POST /v1/waitlist/{entry_id}/cancel**
pub async fn cancel(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
    Path(entry_id): Path<String>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state.service.get_entry(&entry_id).await?;
    managed_event(&state, &user, &entry.event_id).await?;

    let cancelled = state.service.cancel(&entry_id).await?;
    tracing::info!(entry_id = %entry_id, by = %user.id, "Waitlist entry cancelled");
    Ok(Json(cancelled.into()))
}

/// Put a cancelled entrant back on the list
///
/// **POST /v1/waitlist/{entry_id}/reinstate**
pub async fn reinstate(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
    Path(entry_id): Path<String>,
) -> ApiResult<Json<EntryResponse>> {
    let entry = state.service.get_entry(&entry_id).await?;
    managed_event(&state, &user, &entry.event_id).await?;

    let reinstated = state.service.reinstate(&entry_id).await?;
    tracing::info!(entry_id = %entry_id, by = %user.id, "Waitlist entry reinstated");
    Ok(Json(reinstated.into()))
}
