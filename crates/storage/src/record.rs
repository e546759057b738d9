use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use vestry_core::{
    ChurchStatus, Diocese, HeritageClassification, NotificationType, Priority, Recipients,
};

/// One heritage site's administrative record, as stored in the backend.
///
/// The `status` field only changes through the workflow engine. The
/// store applies last-write-wins on it; the engine takes no lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurchRecord {
    pub id: String,
    pub name: String,
    pub status: ChurchStatus,
    pub diocese: Diocese,
    pub classification: HeritageClassification,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub updated_at: String,
}

/// Denormalized snapshot of the originating event, carried on every
/// notification for audit and deep-linking. All fields optional because
/// direct events (feedback, account registration) lack transition data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub church_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub church_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<ChurchStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_status: Option<ChurchStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The unit of delivery.
///
/// `title` and `message` are already interpolated text, not templates.
/// `recipients` is a rule, not a resolved list; resolution happens at
/// read time. Only `read_by` ever mutates after creation, and it only
/// grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub recipients: Recipients,
    pub related_data: RelatedData,
    /// ISO 8601 / RFC 3339 timestamp string.
    pub created_at: String,
    pub read_by: BTreeSet<String>,
    pub action_url: String,
}

impl NotificationRecord {
    pub fn is_read_by(&self, uid: &str) -> bool {
        self.read_by.contains(uid)
    }
}
