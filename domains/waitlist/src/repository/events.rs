//! Read access to events owned by the event catalogue

use konoha_docstore::DocumentStore;
use std::sync::Arc;

use crate::domain::entities::{Event, EVENTS_COLLECTION};
use crate::domain::error::{Result, WaitlistError};

#[derive(Clone)]
pub struct EventRepository {
    store: Arc<dyn DocumentStore>,
}

impl EventRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn find(&self, event_id: &str) -> Result<Option<Event>> {
        match self.store.get(EVENTS_COLLECTION, event_id).await? {
            Some(stored) => Event::from_document(&stored).map(Some),
            None => Ok(None),
        }
    }

    /// Like `find`, but a missing event is `NotFound`
    pub async fn get(&self, event_id: &str) -> Result<Event> {
        self.find(event_id)
            .await?
            .ok_or_else(|| WaitlistError::NotFound(format!("Event {event_id}")))
    }
}
