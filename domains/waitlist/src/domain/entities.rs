//! Domain entities for the waitlist
//!
//! Entries are owned here. Events and users belong to other parts of the
//! product and are only read.

use chrono::{DateTime, Utc};
use konoha_docstore::{Document, StoredDocument};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;

use super::error::{Result, WaitlistError};
use super::state::WaitlistStatus;

pub const WAITLIST_COLLECTION: &str = "onWaitingList";
pub const EVENTS_COLLECTION: &str = "events";
pub const USERS_COLLECTION: &str = "users";

/// Deterministic entry id for an `(event, user)` pair.
///
/// Both parts are length-prefixed so no two distinct pairs share an id.
pub fn entry_id(event_id: &str, user_id: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [event_id, user_id] {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn into_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(WaitlistError::StorageUnavailable(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(WaitlistError::StorageUnavailable(e.to_string())),
    }
}

fn from_document<T: DeserializeOwned>(kind: &str, stored: &StoredDocument) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(stored.data.clone())).map_err(|e| {
        WaitlistError::StorageUnavailable(format!("malformed {kind} {}: {e}", stored.id))
    })
}

// ============================================================================
// Waitlist entry
// ============================================================================

/// One entrant's standing on one event's waitlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub status: WaitlistStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryDocument {
    event_id: String,
    user_id: String,
    status: WaitlistStatus,
}

/// Read side of [`EntryDocument`]; the status is decoded leniently
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntryDocument {
    event_id: String,
    user_id: String,
    #[serde(default)]
    status: Option<serde_json::Value>,
}

impl WaitlistEntry {
    /// A fresh entry in `WAITING`
    pub fn new(event_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let event_id = event_id.into();
        let user_id = user_id.into();
        Self {
            id: entry_id(&event_id, &user_id),
            event_id,
            user_id,
            status: WaitlistStatus::Waiting,
        }
    }

    pub fn to_document(&self) -> Result<Document> {
        into_document(&EntryDocument {
            event_id: self.event_id.clone(),
            user_id: self.user_id.clone(),
            status: self.status,
        })
    }

    /// Decode a stored entry. Only a missing event or user id is an error.
    pub fn from_document(stored: &StoredDocument) -> Result<Self> {
        let doc: StoredEntryDocument = from_document("waitlist entry", stored)?;
        let raw = doc.status.as_ref().and_then(serde_json::Value::as_str);
        let status = WaitlistStatus::from_stored(raw);
        if raw != Some(status.as_str()) {
            tracing::debug!(entry_id = %stored.id, raw_status = ?doc.status, %status, "Read legacy status");
        }
        Ok(Self {
            id: stored.id.clone(),
            event_id: doc.event_id,
            user_id: doc.user_id,
            status,
        })
    }
}

/// Per-event counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WaitlistSummary {
    pub total: usize,
    pub waiting: usize,
    pub selected: usize,
    pub accepted: usize,
    pub declined: usize,
    pub cancelled: usize,
}

impl WaitlistSummary {
    pub fn from_entries(entries: &[WaitlistEntry]) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            summary.total += 1;
            match entry.status {
                WaitlistStatus::Waiting => summary.waiting += 1,
                WaitlistStatus::Selected => summary.selected += 1,
                WaitlistStatus::Accepted => summary.accepted += 1,
                WaitlistStatus::Declined => summary.declined += 1,
                WaitlistStatus::Cancelled => summary.cancelled += 1,
            }
        }
        summary
    }
}

// ============================================================================
// Event
// ============================================================================

/// The event attributes the waitlist depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub organizer_id: String,
    pub title: Option<String>,
    pub registration_deadline: Option<DateTime<Utc>>,
    /// Zero, negative or absent means unlimited
    pub entrant_limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDocument {
    organizer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    registration_deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entrant_limit: Option<i64>,
}

impl Event {
    pub fn has_entrant_limit(&self) -> bool {
        self.entrant_limit.is_some_and(|limit| limit > 0)
    }

    /// The entrant limit, if one is set
    pub fn capacity(&self) -> Option<usize> {
        self.entrant_limit
            .filter(|limit| *limit > 0)
            .and_then(|limit| usize::try_from(limit).ok())
    }

    /// Open until the deadline instant; no deadline means always open
    pub fn is_registration_open(&self, now: DateTime<Utc>) -> bool {
        self.registration_deadline.is_none_or(|deadline| now < deadline)
    }

    /// How the event is named in messages to entrants
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(&self.id)
    }

    pub fn to_document(&self) -> Result<Document> {
        into_document(&EventDocument {
            organizer_id: self.organizer_id.clone(),
            event_title: self.title.clone(),
            registration_deadline: self.registration_deadline,
            entrant_limit: self.entrant_limit,
        })
    }

    pub fn from_document(stored: &StoredDocument) -> Result<Self> {
        let doc: EventDocument = from_document("event", stored)?;
        Ok(Self {
            id: stored.id.clone(),
            organizer_id: doc.organizer_id,
            title: doc.event_title,
            registration_deadline: doc.registration_deadline,
            entrant_limit: doc.entrant_limit,
        })
    }
}

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Entrant,
    Organizer,
    Administrator,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entrant => "ENTRANT",
            Self::Organizer => "ORGANIZER",
            Self::Administrator => "ADMINISTRATOR",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Administrator)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    /// Accepts both `ORGANIZER` and the display spelling `Organizer`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ENTRANT" => Ok(Self::Entrant),
            "ORGANIZER" => Ok(Self::Organizer),
            "ADMINISTRATOR" | "ADMIN" => Ok(Self::Administrator),
            _ => Err(format!("unknown user type: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(default)]
    user_type: Option<String>,
}

impl User {
    /// Read a user record; a missing or unrecognised type reads as an entrant
    pub fn from_document(stored: &StoredDocument) -> Result<Self> {
        let doc: UserDocument = from_document("user", stored)?;
        let role = match doc.user_type.as_deref().map(UserRole::from_str) {
            Some(Ok(role)) => role,
            Some(Err(e)) => {
                tracing::debug!(user_id = %stored.id, error = %e, "Treating user as entrant");
                UserRole::Entrant
            }
            None => UserRole::Entrant,
        };
        Ok(Self {
            id: stored.id.clone(),
            role,
        })
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(
            "userType".to_string(),
            serde_json::Value::String(self.role.as_str().to_string()),
        );
        doc
    }

    /// Administrators manage every event; organizers only their own
    pub fn manages(&self, event: &Event) -> bool {
        self.role.is_admin() || event.organizer_id == self.id
    }
}
