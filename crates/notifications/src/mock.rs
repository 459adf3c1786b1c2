//! Mock Notification Service Implementation
//!
//! Stores notifications in memory for test assertions.
//! Thread-safe via `Arc<Mutex<>>`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{sort_newest_first, Notification, NotificationError, NotificationService};

#[derive(Debug, Default)]
struct Recorded {
    notifications: Vec<Notification>,
    failing_users: HashSet<String>,
}

/// Mock notification service that records notifications for test assertions.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationService {
    inner: Arc<Mutex<Recorded>>,
}

impl MockNotificationService {
    /// Create a new mock notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return all recorded notifications in dispatch order.
    pub fn recorded(&self) -> Vec<Notification> {
        self.lock()
            .map(|inner| inner.notifications.clone())
            .unwrap_or_default()
    }

    /// Recorded notifications addressed to one user, in dispatch order.
    pub fn recorded_for(&self, user_id: &str) -> Vec<Notification> {
        self.recorded()
            .into_iter()
            .filter(|n| n.user_id == user_id)
            .collect()
    }

    /// Make every dispatch to this user fail.
    pub fn fail_for_user(&self, user_id: &str) {
        if let Ok(mut inner) = self.lock() {
            inner.failing_users.insert(user_id.to_string());
        }
    }

    /// Clear recorded notifications and injected failures.
    pub fn reset(&self) {
        if let Ok(mut inner) = self.lock() {
            inner.notifications.clear();
            inner.failing_users.clear();
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Recorded>, NotificationError> {
        self.inner
            .lock()
            .map_err(|e| NotificationError::Delivery(format!("notifications lock poisoned: {e}")))
    }
}

#[async_trait::async_trait]
impl NotificationService for MockNotificationService {
    async fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut inner = self.lock()?;
        if inner.failing_users.contains(&notification.user_id) {
            return Err(NotificationError::Delivery(format!(
                "injected failure for user {}",
                notification.user_id
            )));
        }
        tracing::debug!(
            user_id = %notification.user_id,
            event_id = %notification.event_id,
            notification_type = %notification.notification_type,
            "Mock notifications: recording notification"
        );
        inner.notifications.push(notification);
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>, NotificationError> {
        let mut notifications: Vec<Notification> = self
            .lock()?
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut notifications);
        Ok(notifications)
    }

    async fn delete(&self, user_id: &str, notification_id: &str) -> Result<(), NotificationError> {
        let mut inner = self.lock()?;
        let position = inner
            .notifications
            .iter()
            .position(|n| n.id == notification_id && n.user_id == user_id)
            .ok_or_else(|| NotificationError::NotFound(notification_id.to_string()))?;
        inner.notifications.remove(position);
        Ok(())
    }
}
