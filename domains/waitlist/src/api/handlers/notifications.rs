//! Notification API handlers: organizer broadcasts and the caller's inbox

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use konoha_common::{Pagination, ValidatedJson};
use konoha_notifications::{Notification, NotificationType};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::managed_event;
use crate::api::error::ApiResult;
use crate::api::middleware::{Caller, WaitlistState};
use crate::domain::state::WaitlistStatus;

/// Request for messaging an event's entrants
#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastRequest {
    #[validate(length(min = 1, max = 500))]
    pub message: String,

    /// Only entrants in this status; everyone on the list when absent
    pub status: Option<WaitlistStatus>,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub delivered: usize,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub event_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            event_id: n.event_id,
            notification_type: n.notification_type,
            message: n.message,
            created_at: n.created_at,
        }
    }
}

/// Message an event's entrants
///
/// **POST /v1/events/{event_id}/notifications**
pub async fn broadcast(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
    Path(event_id): Path<String>,
    ValidatedJson(request): ValidatedJson<BroadcastRequest>,
) -> ApiResult<Json<BroadcastResponse>> {
    managed_event(&state, &user, &event_id).await?;

    let delivered = state
        .service
        .notify_entrants(&event_id, request.status, &request.message)
        .await?;

    Ok(Json(BroadcastResponse { delivered }))
}

/// List the caller's notifications, newest first
///
/// **GET /v1/me/notifications?offset=&limit=**
pub async fn list_my_notifications(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<NotificationResponse>>> {
    let notifications = state.service.notifier().list_for_user(&user.id).await?;

    Ok(Json(
        page.apply(notifications)
            .into_iter()
            .map(Into::into)
            .collect(),
    ))
}

/// Delete one of the caller's notifications
///
/// **DELETE /v1/me/notifications/{notification_id}**
pub async fn delete_my_notification(
    Caller(user): Caller,
    State(state): State<WaitlistState>,
    Path(notification_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .service
        .notifier()
        .delete(&user.id, &notification_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
