//! HTTP mapping for waitlist handler failures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use konoha_notifications::NotificationError;
use serde_json::json;

use super::middleware::CallerError;
use crate::domain::error::WaitlistError;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Waitlist(#[from] WaitlistError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error(transparent)]
    Common(#[from] konoha_common::Error),

    #[error("caller rejected: {0:?}")]
    Caller(CallerError),
}

impl From<CallerError> for ApiError {
    fn from(err: CallerError) -> Self {
        ApiError::Caller(err)
    }
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Common(konoha_common::Error::Authorization(message.into()))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Waitlist(e) => match e {
                WaitlistError::NotFound(_) => StatusCode::NOT_FOUND,
                WaitlistError::AlreadyOnWaitlist
                | WaitlistError::IllegalTransition { .. }
                | WaitlistError::RegistrationClosed
                | WaitlistError::WaitlistFull { .. } => StatusCode::CONFLICT,
                WaitlistError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Notification(e) => match e {
                NotificationError::NotFound(_) => StatusCode::NOT_FOUND,
                NotificationError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                NotificationError::Delivery(_) | NotificationError::Malformed(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
            ApiError::Common(e) => e.status_code(),
            // Rendered by CallerError itself
            ApiError::Caller(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = match self {
            ApiError::Caller(e) => return e.into_response(),
            ApiError::Common(e) => return e.into_response(),
            ApiError::Waitlist(e) => {
                if e.is_retryable() {
                    tracing::warn!(error = %e, "Waitlist storage failure");
                }
                (e.error_code(), e.user_message())
            }
            ApiError::Notification(e) => {
                let code = match &e {
                    NotificationError::NotFound(_) => "NOTIFICATION_NOT_FOUND",
                    _ => "NOTIFICATIONS_UNAVAILABLE",
                };
                if status != StatusCode::NOT_FOUND {
                    tracing::warn!(error = %e, "Notification inbox failure");
                }
                let message = match e {
                    NotificationError::NotFound(_) => "Notification not found".to_string(),
                    _ => "Notifications are unavailable, please try again".to_string(),
                };
                (code, message)
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
