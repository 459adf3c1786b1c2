//! Waitlist error kinds

use konoha_docstore::StoreError;
use thiserror::Error;

use super::state::{StateError, WaitlistStatus};

pub type Result<T> = std::result::Result<T, WaitlistError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WaitlistError {
    #[error("User is already on the waitlist for this event")]
    AlreadyOnWaitlist,

    #[error("Not found: {0}")]
    NotFound(String),

    /// `to` is `None` when the entry was to be removed from the list
    #[error("Illegal transition from {from} to {}", describe_target(.to))]
    IllegalTransition {
        from: WaitlistStatus,
        to: Option<WaitlistStatus>,
    },

    #[error("Registration for this event has closed")]
    RegistrationClosed,

    #[error("Waitlist is full ({limit} entrants)")]
    WaitlistFull { limit: usize },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

fn describe_target(to: &Option<WaitlistStatus>) -> String {
    to.map_or_else(|| "REMOVED".to_string(), |status| status.to_string())
}

impl WaitlistError {
    /// Only transient storage failures may be retried with the same input
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }

    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyOnWaitlist => "ALREADY_ON_WAITLIST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::WaitlistFull { .. } => "WAITLIST_FULL",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
        }
    }

    /// Message shown to the person who triggered the failure
    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadyOnWaitlist => {
                "You are already on the waitlist for this event".to_string()
            }
            Self::NotFound(what) => format!("{what} could not be found"),
            Self::IllegalTransition { from, to: Some(to) } => format!(
                "This waitlist entry is {} and cannot become {}",
                from.as_str().to_lowercase(),
                to.as_str().to_lowercase()
            ),
            Self::IllegalTransition { from, to: None } => format!(
                "You can only leave a waitlist while waiting; your entry is {}",
                from.as_str().to_lowercase()
            ),
            Self::RegistrationClosed => "Registration has closed for this event".to_string(),
            Self::WaitlistFull { limit } => {
                format!("This event's waitlist is full ({limit} entrants)")
            }
            Self::StorageUnavailable(_) => {
                "Something went wrong on our side, please try again".to_string()
            }
        }
    }
}

impl From<StoreError> for WaitlistError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => WaitlistError::NotFound("Document".to_string()),
            StoreError::AlreadyExists => WaitlistError::AlreadyOnWaitlist,
            StoreError::PreconditionFailed => {
                WaitlistError::StorageUnavailable("document changed concurrently".to_string())
            }
            StoreError::Unavailable(msg) | StoreError::Malformed(msg) => {
                WaitlistError::StorageUnavailable(msg)
            }
        }
    }
}

impl From<StateError> for WaitlistError {
    fn from(err: StateError) -> Self {
        match &err {
            StateError::InvalidTransition { from, to } => {
                match (from.parse::<WaitlistStatus>(), to.parse::<WaitlistStatus>()) {
                    (Ok(from), Ok(to)) => WaitlistError::IllegalTransition {
                        from,
                        to: Some(to),
                    },
                    _ => WaitlistError::StorageUnavailable(err.to_string()),
                }
            }
            // An unreadable stored status is a data problem, not a rule violation
            StateError::UnknownState(_) => WaitlistError::StorageUnavailable(err.to_string()),
        }
    }
}
