//! Notification composition for waitlist status changes

use konoha_notifications::{Notification, NotificationType};

use crate::domain::entities::WaitlistEntry;
use crate::domain::state::WaitlistStatus;

/// Statuses entrants are told about. Returning to `WAITING` is silent.
pub fn notification_type_for(status: WaitlistStatus) -> Option<NotificationType> {
    match status {
        WaitlistStatus::Waiting => None,
        WaitlistStatus::Selected => Some(NotificationType::LotteryWin),
        WaitlistStatus::Accepted => Some(NotificationType::Accepted),
        WaitlistStatus::Declined => Some(NotificationType::Declined),
        WaitlistStatus::Cancelled => Some(NotificationType::Cancelled),
    }
}

pub fn status_message(status: WaitlistStatus, event_name: &str) -> Option<String> {
    let message = match status {
        WaitlistStatus::Waiting => return None,
        WaitlistStatus::Selected => format!(
            "You have been selected for {event_name}! Please accept or decline your invitation."
        ),
        WaitlistStatus::Accepted => {
            format!("You have accepted your invitation to {event_name}. See you there!")
        }
        WaitlistStatus::Declined => format!("You have declined your invitation to {event_name}."),
        WaitlistStatus::Cancelled => {
            format!("Your place on the waitlist for {event_name} has been cancelled.")
        }
    };
    Some(message)
}

/// The notification owed to an entrant whose entry just reached its current status
pub fn status_notification(entry: &WaitlistEntry, event_name: &str) -> Option<Notification> {
    let notification_type = notification_type_for(entry.status)?;
    let message = status_message(entry.status, event_name)?;
    Some(Notification::new(
        entry.user_id.as_str(),
        entry.event_id.as_str(),
        notification_type,
        message,
    ))
}

/// One organizer broadcast per entrant
pub fn broadcast(entries: &[WaitlistEntry], event_id: &str, message: &str) -> Vec<Notification> {
    entries
        .iter()
        .map(|entry| {
            Notification::new(
                entry.user_id.as_str(),
                event_id,
                NotificationType::Info,
                message,
            )
        })
        .collect()
}
