//! Static notification-kind to console-path mapping.

use crate::notification::NotificationType;

/// Destination path for a notification, suffixed with the originating
/// church when one exists. A static lookup, no dynamic routing.
pub fn action_url(kind: NotificationType, church_id: Option<&str>) -> String {
    use NotificationType::*;
    let base = match kind {
        ChurchSubmitted | HeritageValidated => "/review",
        HeritageReviewAssigned => "/heritage",
        ChurchApproved | RevisionRequested | ChurchUnpublished => "/churches",
        AccountPendingApproval => "/accounts",
        FeedbackReceived => "/feedback",
        Announcement => "/announcements",
    };
    match church_id {
        Some(id) => format!("{base}?church={id}"),
        None => base.to_string(),
    }
}
