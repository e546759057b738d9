//! Transition classification and the role-gated legality table.
//!
//! The same raw `(from, to)` pair can mean different things depending on
//! who performed it: a parish actor moving `pending -> pending` is a
//! resubmission after revision, while a diocesan actor landing on
//! `pending` is requesting a revision. Classification therefore takes
//! the actor's role as a third input and names the semantic kind of the
//! move, which in turn drives notification fan-out.
//!
//! Both functions here are pure and total. No store, no side effects.

use serde::{Deserialize, Serialize};

use crate::status::{ChurchStatus, Diocese, StaffRole};

// ──────────────────────────────────────────────
// Descriptor types
// ──────────────────────────────────────────────

/// The principal that performed a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
    pub role: StaffRole,
}

/// Ephemeral record of an applied status change.
///
/// Produced by the workflow service, consumed by the fan-out engine.
/// Never persisted standalone; a denormalized snapshot of its fields is
/// copied onto each derived notification for audit and deep-linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDescriptor {
    pub church_id: String,
    pub church_name: String,
    pub from_status: ChurchStatus,
    pub to_status: ChurchStatus,
    pub actor: Actor,
    pub diocese: Diocese,
    pub note: Option<String>,
}

/// Semantic kind of a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    SubmittedForReview,
    ForwardedToHeritageReview,
    HeritageValidated,
    ApprovedDirectly,
    RevisionRequested,
    /// No notification is derived, but the status change itself still
    /// applies (e.g. moves into `needs_revision` or `rejected`).
    Unclassified,
}

// ──────────────────────────────────────────────
// Classification
// ──────────────────────────────────────────────

/// Name the semantic kind of a `(from, to, role)` transition.
///
/// Rules are evaluated in priority order; the first match wins. The
/// resubmission clause of rule 1 and rule 5 both target `to = pending`
/// and are disambiguated solely by the actor's role: a non-parish actor
/// can never produce a resubmission reading, even if the prior state
/// suggests one. Stale role data therefore misclassifies; callers own
/// keeping the acting role current.
pub fn classify_transition(
    from: ChurchStatus,
    to: ChurchStatus,
    actor_role: StaffRole,
) -> TransitionKind {
    use ChurchStatus::*;

    // Rule 1: submission, including parish resubmission after revision.
    let submitted = (from == Pending && to == UnderReview)
        || (from == Draft && (to == Pending || to == UnderReview))
        || (to == UnderReview && from != HeritageReview && from != Approved)
        || (actor_role == StaffRole::Parish && to == Pending && from != Draft);
    if submitted {
        return TransitionKind::SubmittedForReview;
    }

    // Rule 2: anything landing on heritage review is a forward.
    if to == HeritageReview {
        return TransitionKind::ForwardedToHeritageReview;
    }

    // Rule 3: approval out of heritage review.
    if from == HeritageReview && to == Approved {
        return TransitionKind::HeritageValidated;
    }

    // Rule 4: approval that skipped the heritage stage.
    if to == Approved && (from == Pending || from == UnderReview) {
        return TransitionKind::ApprovedDirectly;
    }

    // Rule 5: a non-parish actor sending the record back to pending.
    // The parish case already matched rule 1 as a resubmission.
    if to == Pending && from != Draft && actor_role != StaffRole::Parish {
        return TransitionKind::RevisionRequested;
    }

    TransitionKind::Unclassified
}

// ──────────────────────────────────────────────
// Legality
// ──────────────────────────────────────────────

/// The role-gated move table. A move absent from this table is rejected
/// before any write; the church record is left untouched.
pub fn is_legal_transition(from: ChurchStatus, to: ChurchStatus, role: StaffRole) -> bool {
    use ChurchStatus::*;

    match role {
        StaffRole::Parish => matches!(
            (from, to),
            (Draft, Pending)
                | (Draft, UnderReview)
                | (Pending, Pending)
                | (NeedsRevision, Pending)
        ),
        StaffRole::DiocesanOffice => matches!(
            (from, to),
            (Pending, UnderReview)
                | (Pending, Pending)
                | (UnderReview, Pending)
                | (Pending, Approved)
                | (UnderReview, Approved)
                | (UnderReview, HeritageReview)
                | (UnderReview, NeedsRevision)
                | (Pending, Rejected)
                | (UnderReview, Rejected)
                | (Approved, Pending)
        ),
        StaffRole::HeritageReviewer => matches!(
            (from, to),
            (HeritageReview, Approved) | (HeritageReview, Pending) | (HeritageReview, Rejected)
        ),
    }
}
