//! Waitlist operations
//!
//! `WaitlistService` is the entry point for callers. It runs the registration
//! guard before joins and tells entrants about status changes. Notification
//! delivery never fails the change that triggered it.

pub mod lottery;
pub mod notify;
pub mod responder;

use chrono::Utc;
use konoha_notifications::NotificationService;
use std::sync::Arc;

use crate::domain::entities::{Event, User, WaitlistEntry, WaitlistSummary};
use crate::domain::error::{Result, WaitlistError};
use crate::domain::guard::RegistrationGuard;
use crate::domain::state::WaitlistStatus;
use crate::repository::WaitlistRepositories;

pub use lottery::{DrawFailure, DrawOutcome};
pub use responder::InvitationDecision;

#[derive(Clone)]
pub struct WaitlistService {
    repos: WaitlistRepositories,
    notifier: Arc<dyn NotificationService>,
    guard: RegistrationGuard,
}

impl WaitlistService {
    pub fn new(
        repos: WaitlistRepositories,
        notifier: Arc<dyn NotificationService>,
        guard: RegistrationGuard,
    ) -> Self {
        Self {
            repos,
            notifier,
            guard,
        }
    }

    pub fn notifier(&self) -> &Arc<dyn NotificationService> {
        &self.notifier
    }

    pub async fn event(&self, event_id: &str) -> Result<Event> {
        self.repos.events.get(event_id).await
    }

    pub async fn user(&self, user_id: &str) -> Result<Option<User>> {
        self.repos.users.find(user_id).await
    }

    /// Join an event's waitlist.
    ///
    /// An existing entry always wins over deadline and capacity, so a member
    /// is never turned away by their own presence on a full list.
    pub async fn join(&self, event_id: &str, user_id: &str) -> Result<WaitlistEntry> {
        if self.repos.entries.find(event_id, user_id).await?.is_some() {
            return Err(WaitlistError::AlreadyOnWaitlist);
        }

        let event = self.repos.events.get(event_id).await?;
        let entries = self.repos.entries.list_by_event(event_id).await?;
        if let Err(e) = self.guard.check(&event, &entries, Utc::now()) {
            tracing::info!(event_id, user_id, reason = %e, "Join rejected");
            return Err(e);
        }

        self.repos.entries.join(event_id, user_id).await
    }

    pub async fn leave(&self, event_id: &str, user_id: &str) -> Result<()> {
        self.repos.entries.leave(event_id, user_id).await
    }

    pub async fn find(&self, event_id: &str, user_id: &str) -> Result<Option<WaitlistEntry>> {
        self.repos.entries.find(event_id, user_id).await
    }

    pub async fn get_entry(&self, entry_id: &str) -> Result<WaitlistEntry> {
        self.repos.entries.get(entry_id).await
    }

    pub async fn list_by_event(&self, event_id: &str) -> Result<Vec<WaitlistEntry>> {
        self.repos.entries.list_by_event(event_id).await
    }

    pub async fn list_by_event_with_status(
        &self,
        event_id: &str,
        status: WaitlistStatus,
    ) -> Result<Vec<WaitlistEntry>> {
        self.repos
            .entries
            .list_by_event_with_status(event_id, status)
            .await
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<WaitlistEntry>> {
        self.repos.entries.list_by_user(user_id).await
    }

    pub async fn summarize(&self, event_id: &str) -> Result<WaitlistSummary> {
        let entries = self.repos.entries.list_by_event(event_id).await?;
        Ok(WaitlistSummary::from_entries(&entries))
    }

    /// Change an entry's status and notify the entrant.
    pub async fn update_status(
        &self,
        entry_id: &str,
        status: WaitlistStatus,
    ) -> Result<WaitlistEntry> {
        let entry = self.repos.entries.update_status(entry_id, status).await?;
        self.announce(&entry, None).await;
        Ok(entry)
    }

    /// Administrative removal. The entry is kept, as `CANCELLED`.
    pub async fn cancel(&self, entry_id: &str) -> Result<WaitlistEntry> {
        self.update_status(entry_id, WaitlistStatus::Cancelled).await
    }

    /// Put a cancelled entry back on the list. The entrant is not notified.
    pub async fn reinstate(&self, entry_id: &str) -> Result<WaitlistEntry> {
        self.repos
            .entries
            .update_status(entry_id, WaitlistStatus::Waiting)
            .await
    }

    /// Send an organizer message to an event's entrants, optionally only
    /// those in one status. Returns how many notifications were recorded.
    pub async fn notify_entrants(
        &self,
        event_id: &str,
        status: Option<WaitlistStatus>,
        message: &str,
    ) -> Result<usize> {
        let event = self.repos.events.get(event_id).await?;
        let entries = match status {
            Some(status) => {
                self.repos
                    .entries
                    .list_by_event_with_status(event_id, status)
                    .await?
            }
            None => self.repos.entries.list_by_event(event_id).await?,
        };

        let report = self
            .notifier
            .dispatch_many(notify::broadcast(&entries, &event.id, message))
            .await;

        for (user_id, error) in &report.failed {
            tracing::warn!(event_id, %user_id, %error, "Broadcast notification failed");
        }
        tracing::info!(
            event_id,
            status = ?status,
            recipients = entries.len(),
            delivered = report.delivered,
            "Broadcast sent"
        );
        Ok(report.delivered)
    }

    /// Tell the entrant about their entry's current status, if it is one they hear about
    async fn announce(&self, entry: &WaitlistEntry, event: Option<&Event>) {
        let event_name = match event {
            Some(event) => event.display_name().to_string(),
            None => match self.repos.events.find(&entry.event_id).await {
                Ok(Some(event)) => event.display_name().to_string(),
                _ => entry.event_id.clone(),
            },
        };

        let Some(notification) = notify::status_notification(entry, &event_name) else {
            return;
        };

        if let Err(e) = self.notifier.dispatch(notification).await {
            tracing::warn!(
                entry_id = %entry.id,
                user_id = %entry.user_id,
                status = %entry.status,
                error = %e,
                "Status notification failed"
            );
        }
    }
}
