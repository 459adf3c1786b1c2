//! Waitlist entry repository
//!
//! Sole writer of the waitlist collection. Uniqueness per `(event, user)` pair
//! rests on the deterministic entry id and the store's conditional create.

use konoha_docstore::{Document, DocumentStore, Filter, StoreError, StoredDocument};
use std::sync::Arc;

use crate::domain::entities::{entry_id, WaitlistEntry, WAITLIST_COLLECTION};
use crate::domain::error::{Result, WaitlistError};
use crate::domain::state::{WaitlistStateMachine, WaitlistStatus};

/// Attempts at a compare-and-set status write before giving up
const MAX_STATUS_WRITE_ATTEMPTS: usize = 5;

/// Precondition that the stored status is still exactly what was read.
///
/// Legacy rows may carry a shorthand or no status at all, so the raw value is
/// compared rather than the decoded one.
fn unchanged_status(stored: &StoredDocument) -> Filter {
    match stored.data.get("status") {
        Some(raw) => Filter::eq("status", raw.clone()),
        None => Filter::absent("status"),
    }
}

/// Decode every row that can be decoded. A row without an event or user id
/// cannot belong to any pair and is left out.
fn decode_all(stored: &[StoredDocument]) -> Vec<WaitlistEntry> {
    stored
        .iter()
        .filter_map(|doc| match WaitlistEntry::from_document(doc) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(entry_id = %doc.id, error = %e, "Skipping malformed waitlist entry");
                None
            }
        })
        .collect()
}

fn entry_not_found(entry_id: &str) -> WaitlistError {
    WaitlistError::NotFound(format!("Waitlist entry {entry_id}"))
}

#[derive(Clone)]
pub struct WaitlistRepository {
    store: Arc<dyn DocumentStore>,
}

impl WaitlistRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn query(&self, filters: &[Filter]) -> Result<Vec<WaitlistEntry>> {
        let stored = self.store.query(WAITLIST_COLLECTION, filters).await?;
        let mut entries = decode_all(&stored);
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    /// Add a user to an event's waitlist in `WAITING`.
    pub async fn join(&self, event_id: &str, user_id: &str) -> Result<WaitlistEntry> {
        // Entries written before ids were derived from the pair are only found by query
        if self.find(event_id, user_id).await?.is_some() {
            return Err(WaitlistError::AlreadyOnWaitlist);
        }

        let entry = WaitlistEntry::new(event_id, user_id);
        match self
            .store
            .create_with_id(WAITLIST_COLLECTION, &entry.id, entry.to_document()?)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    event_id,
                    user_id,
                    entry_id = %entry.id,
                    "Joined waitlist"
                );
                Ok(entry)
            }
            Err(StoreError::AlreadyExists) => Err(WaitlistError::AlreadyOnWaitlist),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a user's entry. Only a `WAITING` entry may be removed.
    pub async fn leave(&self, event_id: &str, user_id: &str) -> Result<()> {
        let entry = self
            .find(event_id, user_id)
            .await?
            .ok_or_else(|| WaitlistError::NotFound("Waitlist entry".to_string()))?;

        let (entry, stored) = self.fetch(&entry.id).await?;
        if entry.status != WaitlistStatus::Waiting {
            return Err(WaitlistError::IllegalTransition {
                from: entry.status,
                to: None,
            });
        }

        match self
            .store
            .delete_if(WAITLIST_COLLECTION, &entry.id, &[unchanged_status(&stored)])
            .await
        {
            Ok(()) => {
                tracing::info!(event_id, user_id, entry_id = %entry.id, "Left waitlist");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(entry_not_found(&entry.id)),
            // Changed since we read it, report against the status it has now
            Err(StoreError::PreconditionFailed) => {
                let current = self.get(&entry.id).await?;
                Err(WaitlistError::IllegalTransition {
                    from: current.status,
                    to: None,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find(&self, event_id: &str, user_id: &str) -> Result<Option<WaitlistEntry>> {
        if let Some(stored) = self
            .store
            .get(WAITLIST_COLLECTION, &entry_id(event_id, user_id))
            .await?
        {
            if let Some(entry) = decode_all(std::slice::from_ref(&stored)).pop() {
                return Ok(Some(entry));
            }
        }

        let matches = self
            .query(&[
                Filter::eq("eventId", event_id),
                Filter::eq("userId", user_id),
            ])
            .await?;
        Ok(matches.into_iter().next())
    }

    pub async fn get(&self, entry_id: &str) -> Result<WaitlistEntry> {
        self.fetch(entry_id).await.map(|(entry, _)| entry)
    }

    /// Read an entry together with the raw document it was decoded from
    async fn fetch(&self, entry_id: &str) -> Result<(WaitlistEntry, StoredDocument)> {
        let stored = self
            .store
            .get(WAITLIST_COLLECTION, entry_id)
            .await?
            .ok_or_else(|| entry_not_found(entry_id))?;
        match decode_all(std::slice::from_ref(&stored)).pop() {
            Some(entry) => Ok((entry, stored)),
            None => Err(entry_not_found(entry_id)),
        }
    }

    pub async fn list_by_event(&self, event_id: &str) -> Result<Vec<WaitlistEntry>> {
        let entries = self.query(&[Filter::eq("eventId", event_id)]).await?;
        tracing::debug!(event_id, count = entries.len(), "Listed event waitlist");
        Ok(entries)
    }

    pub async fn list_by_event_with_status(
        &self,
        event_id: &str,
        status: WaitlistStatus,
    ) -> Result<Vec<WaitlistEntry>> {
        // Legacy spellings only decode after reading, so filter here
        let mut entries = self.list_by_event(event_id).await?;
        entries.retain(|entry| entry.status == status);
        Ok(entries)
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<WaitlistEntry>> {
        self.query(&[Filter::eq("userId", user_id)]).await
    }

    /// Move an entry to a new status if the transition is legal.
    ///
    /// The write only applies if the status is still the one that was
    /// validated. On a lost race the entry is re-read and re-validated.
    pub async fn update_status(
        &self,
        entry_id: &str,
        new_status: WaitlistStatus,
    ) -> Result<WaitlistEntry> {
        for attempt in 1..=MAX_STATUS_WRITE_ATTEMPTS {
            let (mut entry, stored) = self.fetch(entry_id).await?;
            let from = entry.status;
            WaitlistStateMachine::transition(from, new_status)?;

            let mut fields = Document::new();
            fields.insert(
                "status".to_string(),
                serde_json::Value::String(new_status.as_str().to_string()),
            );

            match self
                .store
                .update_if(WAITLIST_COLLECTION, entry_id, &[unchanged_status(&stored)], fields)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        entry_id,
                        event_id = %entry.event_id,
                        user_id = %entry.user_id,
                        %from,
                        to = %new_status,
                        "Waitlist status changed"
                    );
                    entry.status = new_status;
                    return Ok(entry);
                }
                Err(StoreError::PreconditionFailed) => {
                    tracing::debug!(entry_id, attempt, "Status changed concurrently, retrying");
                }
                Err(StoreError::NotFound) => return Err(entry_not_found(entry_id)),
                Err(e) => return Err(e.into()),
            }
        }

        Err(WaitlistError::StorageUnavailable(format!(
            "entry {entry_id} kept changing during status update"
        )))
    }
}
