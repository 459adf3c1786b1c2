//! Waitlist status state machine
//!
//! ```text
//! WAITING --lottery--> SELECTED --entrant--> ACCEPTED
//!                          \------entrant--> DECLINED
//! WAITING | SELECTED | ACCEPTED | DECLINED --admin--> CANCELLED
//! CANCELLED --admin--> WAITING
//! ```
//!
//! No status is terminal: every entry can still be cancelled, and a
//! cancelled entry can be reinstated.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use konoha_common::StateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitlistStatus {
    /// Older records spell this `PENDING`
    #[serde(alias = "PENDING")]
    Waiting,
    Selected,
    Accepted,
    Declined,
    Cancelled,
}

impl WaitlistStatus {
    pub const ALL: [WaitlistStatus; 5] = [
        Self::Waiting,
        Self::Selected,
        Self::Accepted,
        Self::Declined,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Selected => "SELECTED",
            Self::Accepted => "ACCEPTED",
            Self::Declined => "DECLINED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Decode a stored status the way older clients wrote it.
    ///
    /// Missing and unrecognised values read as `WAITING`; single-letter
    /// shorthands map to their status.
    pub fn from_stored(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Waiting;
        };
        if let Ok(status) = raw.parse() {
            return status;
        }
        match raw.trim().to_ascii_lowercase().as_str() {
            "a" => Self::Accepted,
            "d" => Self::Declined,
            "c" => Self::Cancelled,
            _ => Self::Waiting,
        }
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [WaitlistStatus] {
        match self {
            Self::Waiting => &[Self::Selected, Self::Cancelled],
            Self::Selected => &[Self::Accepted, Self::Declined, Self::Cancelled],
            Self::Accepted => &[Self::Cancelled],
            Self::Declined => &[Self::Cancelled],
            Self::Cancelled => &[Self::Waiting],
        }
    }

    pub fn can_transition_to(&self, next: WaitlistStatus) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Whether the entry still holds a place on the list
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Declined)
    }
}

impl std::fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaitlistStatus {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WAITING" | "PENDING" => Ok(Self::Waiting),
            "SELECTED" => Ok(Self::Selected),
            "ACCEPTED" => Ok(Self::Accepted),
            "DECLINED" => Ok(Self::Declined),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(StateError::UnknownState(s.to_string())),
        }
    }
}

/// Waitlist state machine
pub struct WaitlistStateMachine;

impl WaitlistStateMachine {
    /// Validate a requested status change, returning the new status
    pub fn transition(
        current: WaitlistStatus,
        requested: WaitlistStatus,
    ) -> Result<WaitlistStatus, StateError> {
        if current.can_transition_to(requested) {
            Ok(requested)
        } else {
            Err(StateError::InvalidTransition {
                from: current.to_string(),
                to: requested.to_string(),
            })
        }
    }
}
