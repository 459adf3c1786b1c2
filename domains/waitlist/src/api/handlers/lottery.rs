//! Lottery draw API handler

use axum::{
    extract::{Path, State},
    Json,
};
use konoha_common::ValidatedJson;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::entries::EntryResponse;
use super::managed_event;
use crate::api::error::ApiResult;
use crate::api::middleware::{Caller, WaitlistState};
use crate::service::{DrawFailure, DrawOutcome};

/// Request for running a lottery draw
#[derive(Debug, Deserialize, Validate)]
pub struct DrawRequest {
    /// How many entrants should hold an invitation once the draw is done
    #[validate(range(min = 0))]
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct DrawFailureResponse {
    pub entry_id: String,
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl From<DrawFailure> for DrawFailureResponse {
    fn from(failure: DrawFailure) -> Self {
        Self {
            code: failure.error.error_code(),
            message: failure.error.user_message(),
            retryable: failure.error.is_retryable(),
            entry_id: failure.entry_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrawResponse {
    pub requested: usize,
    pub already_selected: usize,
    pub selected: Vec<EntryResponse>,
    pub failed: Vec<DrawFailureResponse>,
    pub remaining_waiting: usize,
}

impl From<DrawOutcome> for DrawResponse {
    fn from(outcome: DrawOutcome) -> Self {
        Self {
            requested: outcome.requested,
            already_selected: outcome.already_selected,
            selected: outcome.drawn.into_iter().map(Into::into).collect(),
            failed: outcome.failed.into_iter().map(Into::into).collect(),
            remaining_waiting: outcome.remaining_waiting,
        }
    }
}

/// Draw entrants from an event's waitlist
///
/// **POST /v1/events/{event_id}/lottery**
///
/// Partial failures are reported in `failed`; running the same draw again
/// only tops up the missing invitations.
pub async fn draw(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
    Path(event_id): Path<String>,
    ValidatedJson(request): ValidatedJson<DrawRequest>,
) -> ApiResult<Json<DrawResponse>> {
    managed_event(&state, &user, &event_id).await?;

    // range(min = 0) leaves only non-negative counts
    let count = usize::try_from(request.count).unwrap_or(usize::MAX);
    let outcome = state.service.select_entrants(&event_id, count).await?;

    Ok(Json(outcome.into()))
}
