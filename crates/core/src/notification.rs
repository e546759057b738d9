//! Notification kinds, the closed recipient-rule language, and the
//! static transition-kind routing table.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::status::{Diocese, StaffRole};
use crate::transition::TransitionKind;

// ──────────────────────────────────────────────
// Notification kinds
// ──────────────────────────────────────────────

/// Closed set of notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ChurchSubmitted,
    HeritageReviewAssigned,
    HeritageValidated,
    ChurchApproved,
    RevisionRequested,
    ChurchUnpublished,
    AccountPendingApproval,
    FeedbackReceived,
    Announcement,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::ChurchSubmitted => "church_submitted",
            NotificationType::HeritageReviewAssigned => "heritage_review_assigned",
            NotificationType::HeritageValidated => "heritage_validated",
            NotificationType::ChurchApproved => "church_approved",
            NotificationType::RevisionRequested => "revision_requested",
            NotificationType::ChurchUnpublished => "church_unpublished",
            NotificationType::AccountPendingApproval => "account_pending_approval",
            NotificationType::FeedbackReceived => "feedback_received",
            NotificationType::Announcement => "announcement",
        }
    }

    /// Whether parish viewers see this kind only when it targets their
    /// own parish.
    ///
    /// Kinds outside this set are visible diocese-wide to every parish,
    /// which is what broadcasts rely on. A new variant added without a
    /// decision here defaults open (diocese-wide for parish viewers).
    pub fn is_parish_scoped(&self) -> bool {
        matches!(
            self,
            NotificationType::ChurchApproved
                | NotificationType::ChurchUnpublished
                | NotificationType::RevisionRequested
                | NotificationType::HeritageReviewAssigned
                | NotificationType::HeritageValidated
                | NotificationType::AccountPendingApproval
                | NotificationType::FeedbackReceived
        )
    }
}

/// Delivery priority, carried on the record for the UI to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

// ──────────────────────────────────────────────
// Recipient rules
// ──────────────────────────────────────────────

/// The stored, unresolved targeting rule on a notification, evaluated at
/// read time against a viewer.
///
/// This is a closed rule language, not arbitrary predicates: the backing
/// store can evaluate exactly one array-membership filter per query, so
/// the read path queries on user id or role and applies the diocese and
/// parish narrowing in process. Written once at creation, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recipients {
    /// Explicit user targeting. Bypasses diocese and parish narrowing.
    ByUser { user_ids: BTreeSet<String> },
    /// Role targeting, optionally narrowed to a set of dioceses. An
    /// empty diocese set means every diocese.
    ByRole {
        roles: BTreeSet<StaffRole>,
        dioceses: BTreeSet<Diocese>,
    },
    /// Role targeting further narrowed to a single parish. Used for the
    /// parish-facing channel so that a revision request for one church
    /// never leaks into another parish's feed.
    ByRoleAndParish {
        roles: BTreeSet<StaffRole>,
        dioceses: BTreeSet<Diocese>,
        parish_id: String,
    },
}

impl Recipients {
    /// Build the rule for a role-targeted notification in one diocese.
    ///
    /// When the role set includes `Parish` the rule is narrowed to the
    /// originating church's parish; every other role set gets a plain
    /// diocese-wide role rule.
    pub fn for_roles(
        roles: impl IntoIterator<Item = StaffRole>,
        diocese: Diocese,
        church_id: &str,
    ) -> Recipients {
        let roles: BTreeSet<StaffRole> = roles.into_iter().collect();
        let dioceses: BTreeSet<Diocese> = [diocese].into_iter().collect();
        if roles.contains(&StaffRole::Parish) {
            Recipients::ByRoleAndParish {
                roles,
                dioceses,
                parish_id: church_id.to_string(),
            }
        } else {
            Recipients::ByRole { roles, dioceses }
        }
    }

    pub fn roles(&self) -> Option<&BTreeSet<StaffRole>> {
        match self {
            Recipients::ByUser { .. } => None,
            Recipients::ByRole { roles, .. } | Recipients::ByRoleAndParish { roles, .. } => {
                Some(roles)
            }
        }
    }

    pub fn dioceses(&self) -> Option<&BTreeSet<Diocese>> {
        match self {
            Recipients::ByUser { .. } => None,
            Recipients::ByRole { dioceses, .. }
            | Recipients::ByRoleAndParish { dioceses, .. } => Some(dioceses),
        }
    }

    pub fn parish_id(&self) -> Option<&str> {
        match self {
            Recipients::ByRoleAndParish { parish_id, .. } => Some(parish_id),
            _ => None,
        }
    }
}

/// The principal a recipient rule is evaluated against at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewingUser {
    pub uid: String,
    pub role: StaffRole,
    pub diocese: Diocese,
    /// The church id this principal's parish manages. Only meaningful
    /// for `Parish` viewers; `None` for office and reviewer staff.
    pub parish_id: Option<String>,
}

// ──────────────────────────────────────────────
// Routing table
// ──────────────────────────────────────────────

/// One derivation row: a notification kind and the roles it targets.
pub type Route = (NotificationType, &'static [StaffRole]);

/// Static routing table from transition kind to notification intents.
///
/// `HeritageValidated` fans out twice: the diocesan office learns the
/// heritage stage passed, and the parish learns its church is approved.
pub fn routes_for(kind: TransitionKind) -> &'static [Route] {
    use NotificationType::*;
    use StaffRole::*;
    match kind {
        TransitionKind::SubmittedForReview => &[(ChurchSubmitted, &[DiocesanOffice])],
        TransitionKind::ForwardedToHeritageReview => {
            &[(HeritageReviewAssigned, &[HeritageReviewer])]
        }
        TransitionKind::HeritageValidated => &[
            (HeritageValidated, &[DiocesanOffice]),
            (ChurchApproved, &[Parish]),
        ],
        TransitionKind::ApprovedDirectly => &[(ChurchApproved, &[Parish])],
        TransitionKind::RevisionRequested => &[(RevisionRequested, &[Parish])],
        TransitionKind::Unclassified => &[],
    }
}
