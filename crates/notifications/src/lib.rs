//! Konoha Notifications
//!
//! Produces notification records for entrants and serves their inbox:
//! - Document-store backed service (records land in the `notifications` collection)
//! - Mock service that records notifications for test assertions
//!
//! Delivery to devices happens outside this crate.

pub mod mock;
pub mod store;

use chrono::{DateTime, Utc};
use konoha_docstore::{DocumentStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use mock::MockNotificationService;
pub use store::DocumentNotificationService;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotificationError {
    #[error("Notification configuration error: {0}")]
    Configuration(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Notification not found: {0}")]
    NotFound(String),

    #[error("Malformed notification: {0}")]
    Malformed(String),
}

impl From<StoreError> for NotificationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Malformed(msg) => NotificationError::Malformed(msg),
            other => NotificationError::Delivery(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// Entrant was drawn in the lottery
    LotteryWin,
    Accepted,
    Declined,
    Cancelled,
    /// Free-form organizer broadcast
    Info,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NotificationType::LotteryWin => "LOTTERY_WIN",
            NotificationType::Accepted => "ACCEPTED",
            NotificationType::Declined => "DECLINED",
            NotificationType::Cancelled => "CANCELLED",
            NotificationType::Info => "INFO",
        };
        f.write_str(name)
    }
}

/// A notification addressed to one user about one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        event_id: impl Into<String>,
        notification_type: NotificationType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            event_id: event_id.into(),
            notification_type,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Outcome of dispatching a batch of notifications.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: usize,
    /// Recipient user id and the reason delivery failed
    pub failed: Vec<(String, NotificationError)>,
}

/// Notification service trait for different implementations.
#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    /// Record a single notification.
    async fn dispatch(&self, notification: Notification) -> Result<(), NotificationError>;

    /// Record several notifications independently; one failure does not stop the rest.
    async fn dispatch_many(&self, notifications: Vec<Notification>) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for notification in notifications {
            let user_id = notification.user_id.clone();
            match self.dispatch(notification).await {
                Ok(()) => report.delivered += 1,
                Err(e) => report.failed.push((user_id, e)),
            }
        }
        report
    }

    /// A user's notifications, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>, NotificationError>;

    /// Delete one of a user's notifications.
    ///
    /// Fails with `NotFound` if it does not exist or belongs to someone else.
    async fn delete(&self, user_id: &str, notification_id: &str) -> Result<(), NotificationError>;
}

/// Newest first, ties broken by id so listings are stable
pub(crate) fn sort_newest_first(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Notification service configuration.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Notification provider (store, mock)
    pub provider: String,
}

/// Factory for creating NotificationService implementations.
pub struct NotificationServiceFactory;

impl NotificationServiceFactory {
    /// Create a NotificationService based on configuration.
    pub fn create(
        config: &NotificationConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Arc<dyn NotificationService>, NotificationError> {
        match config.provider.as_str() {
            "store" => {
                tracing::info!("Creating document-store notification service");
                Ok(Arc::new(DocumentNotificationService::new(store)))
            }
            "mock" => {
                tracing::info!("Creating mock notification service");
                Ok(Arc::new(MockNotificationService::new()))
            }
            provider => Err(NotificationError::Configuration(format!(
                "Unknown notification provider: {}. Supported providers: store, mock",
                provider
            ))),
        }
    }
}
