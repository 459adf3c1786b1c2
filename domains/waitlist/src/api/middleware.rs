//! Waitlist domain state and caller identification
//!
//! Callers identify themselves with the `X-User-Id` header. The id is looked
//! up in the `users` collection to learn the caller's role.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::entities::{User, UserRole};
use crate::service::WaitlistService;

/// Header carrying the caller's user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Application state for the Waitlist domain
#[derive(Clone)]
pub struct WaitlistState {
    pub service: WaitlistService,
}

impl WaitlistState {
    pub fn new(service: WaitlistService) -> Self {
        Self { service }
    }
}

impl FromRef<WaitlistState> for WaitlistService {
    fn from_ref(state: &WaitlistState) -> Self {
        state.service.clone()
    }
}

/// Caller identification error
#[derive(Debug)]
pub enum CallerError {
    MissingIdentity,
    InvalidIdentity,
    UnknownUser,
    /// Role insufficient for this operation
    EntrantsOnly,
    LookupFailed,
}

impl IntoResponse for CallerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            CallerError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                "MISSING_IDENTITY",
                "X-User-Id header required",
            ),
            CallerError::InvalidIdentity => (
                StatusCode::UNAUTHORIZED,
                "INVALID_IDENTITY",
                "X-User-Id header is not a valid user id",
            ),
            CallerError::UnknownUser => {
                (StatusCode::UNAUTHORIZED, "USER_NOT_FOUND", "User not found")
            }
            CallerError::EntrantsOnly => (
                StatusCode::FORBIDDEN,
                "INSUFFICIENT_ROLE",
                "Only entrants can join or leave a waitlist",
            ),
            CallerError::LookupFailed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "USER_LOOKUP_FAILED",
                "Failed to load user, please try again",
            ),
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

/// Identified caller, any role
#[derive(Debug)]
pub struct Caller(pub User);

impl<S> FromRequestParts<S> for Caller
where
    WaitlistService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = CallerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let service = WaitlistService::from_ref(state);

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(CallerError::MissingIdentity)?
            .to_str()
            .map_err(|_| CallerError::InvalidIdentity)?
            .trim();
        if user_id.is_empty() {
            return Err(CallerError::InvalidIdentity);
        }

        let user = service
            .user(user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id, "Failed to load caller");
                CallerError::LookupFailed
            })?
            .ok_or(CallerError::UnknownUser)?;

        Ok(Caller(user))
    }
}

/// Entrant-role caller extractor.
///
/// Like `Caller` but rejects organizers and administrators with 403.
#[derive(Debug)]
pub struct Entrant(pub User);

impl<S> FromRequestParts<S> for Entrant
where
    WaitlistService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = CallerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Caller(user) = Caller::from_request_parts(parts, state).await?;

        if user.role != UserRole::Entrant {
            return Err(CallerError::EntrantsOnly);
        }

        Ok(Entrant(user))
    }
}
