//! Entrant responses to lottery invitations

use serde::{Deserialize, Serialize};
use std::fmt;

use super::WaitlistService;
use crate::domain::entities::WaitlistEntry;
use crate::domain::error::{Result, WaitlistError};
use crate::domain::state::WaitlistStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationDecision {
    #[serde(alias = "ACCEPT")]
    Accepted,
    #[serde(alias = "DECLINE")]
    Declined,
}

impl InvitationDecision {
    pub fn target_status(self) -> WaitlistStatus {
        match self {
            Self::Accepted => WaitlistStatus::Accepted,
            Self::Declined => WaitlistStatus::Declined,
        }
    }
}

impl fmt::Display for InvitationDecision {
    #[mutants::skip] // Only rendered into log fields
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target_status())
    }
}

impl WaitlistService {
    /// Accept or decline an invitation. Only a `SELECTED` entry can respond,
    /// and a response is final.
    pub async fn respond(
        &self,
        entry_id: &str,
        decision: InvitationDecision,
    ) -> Result<WaitlistEntry> {
        let target = decision.target_status();
        let entry = self.repos.entries.get(entry_id).await?;
        if entry.status != WaitlistStatus::Selected {
            tracing::info!(
                entry_id,
                status = %entry.status,
                %decision,
                "Invitation response rejected"
            );
            return Err(WaitlistError::IllegalTransition {
                from: entry.status,
                to: Some(target),
            });
        }

        let updated = self.update_status(entry_id, target).await?;
        tracing::info!(
            entry_id,
            event_id = %updated.event_id,
            user_id = %updated.user_id,
            %decision,
            "Invitation answered"
        );
        Ok(updated)
    }
}
