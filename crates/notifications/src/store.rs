//! Document-store backed notification service
//!
//! Each notification is one document in the `notifications` collection.

use chrono::{DateTime, Utc};
use konoha_docstore::{Document, DocumentStore, Filter, StoreError, StoredDocument};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{sort_newest_first, Notification, NotificationError, NotificationService, NotificationType};

pub const NOTIFICATIONS_COLLECTION: &str = "notifications";

/// Stored shape of a notification; the id is the document key.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationDocument {
    user_id: String,
    event_id: String,
    notification_type: NotificationType,
    message: String,
    date_created: DateTime<Utc>,
}

impl NotificationDocument {
    fn from_notification(notification: &Notification) -> Self {
        Self {
            user_id: notification.user_id.clone(),
            event_id: notification.event_id.clone(),
            notification_type: notification.notification_type,
            message: notification.message.clone(),
            date_created: notification.created_at,
        }
    }

    fn into_notification(self, id: String) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            event_id: self.event_id,
            notification_type: self.notification_type,
            message: self.message,
            created_at: self.date_created,
        }
    }

    fn to_document(&self) -> Result<Document, NotificationError> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) => Err(NotificationError::Malformed(
                "notification did not serialize to an object".to_string(),
            )),
            Err(e) => Err(NotificationError::Malformed(e.to_string())),
        }
    }
}

fn decode(stored: StoredDocument) -> Result<Notification, NotificationError> {
    let doc: NotificationDocument = serde_json::from_value(serde_json::Value::Object(stored.data))
        .map_err(|e| NotificationError::Malformed(format!("notification {}: {e}", stored.id)))?;
    Ok(doc.into_notification(stored.id))
}

#[derive(Clone)]
pub struct DocumentNotificationService {
    store: Arc<dyn DocumentStore>,
}

impl DocumentNotificationService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl NotificationService for DocumentNotificationService {
    async fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        let doc = NotificationDocument::from_notification(&notification).to_document()?;
        self.store
            .create_with_id(NOTIFICATIONS_COLLECTION, &notification.id, doc)
            .await?;

        tracing::debug!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            event_id = %notification.event_id,
            notification_type = %notification.notification_type,
            "Notification recorded"
        );
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>, NotificationError> {
        let stored = self
            .store
            .query(NOTIFICATIONS_COLLECTION, &[Filter::eq("userId", user_id)])
            .await?;

        let mut notifications = Vec::with_capacity(stored.len());
        for doc in stored {
            match decode(doc) {
                Ok(notification) => notifications.push(notification),
                // One bad record should not hide the rest of the inbox
                Err(e) => tracing::warn!(user_id, error = %e, "Skipping malformed notification"),
            }
        }
        sort_newest_first(&mut notifications);
        Ok(notifications)
    }

    async fn delete(&self, user_id: &str, notification_id: &str) -> Result<(), NotificationError> {
        match self
            .store
            .delete_if(
                NOTIFICATIONS_COLLECTION,
                notification_id,
                &[Filter::eq("userId", user_id)],
            )
            .await
        {
            Ok(()) => {
                tracing::info!(user_id, notification_id, "Notification deleted");
                Ok(())
            }
            Err(StoreError::NotFound | StoreError::PreconditionFailed) => {
                Err(NotificationError::NotFound(notification_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
