//! Capacity and deadline checks run before a join is written

use chrono::{DateTime, Utc};
use std::str::FromStr;

use super::entities::{Event, WaitlistEntry};
use super::error::{Result, WaitlistError};
use super::state::WaitlistStatus;

/// Which existing entries count against an event's entrant limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapacityPolicy {
    /// Every entry on the list, whatever its status
    #[default]
    AllEntries,
    /// Entries that are neither cancelled nor declined
    ActiveEntries,
    WaitingOnly,
}

impl CapacityPolicy {
    pub fn counts(&self, status: WaitlistStatus) -> bool {
        match self {
            Self::AllEntries => true,
            Self::ActiveEntries => status.is_active(),
            Self::WaitingOnly => status == WaitlistStatus::Waiting,
        }
    }
}

impl FromStr for CapacityPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all_entries" => Ok(Self::AllEntries),
            "active_entries" => Ok(Self::ActiveEntries),
            "waiting_only" => Ok(Self::WaitingOnly),
            other => Err(format!(
                "Unknown capacity policy: {other}. Supported values: all_entries, active_entries, waiting_only"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationGuard {
    policy: CapacityPolicy,
}

impl RegistrationGuard {
    pub fn new(policy: CapacityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    /// Reject a join after the deadline or once the event is full.
    ///
    /// `entries` is the event's current waitlist.
    pub fn check(&self, event: &Event, entries: &[WaitlistEntry], now: DateTime<Utc>) -> Result<()> {
        if !event.is_registration_open(now) {
            return Err(WaitlistError::RegistrationClosed);
        }

        if let Some(limit) = event.capacity() {
            let counted = entries
                .iter()
                .filter(|entry| self.policy.counts(entry.status))
                .count();
            if counted >= limit {
                return Err(WaitlistError::WaitlistFull { limit });
            }
        }

        Ok(())
    }
}
