//! Closed enums for church lifecycle status, staff roles, and jurisdictions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Administrative lifecycle status of a church record.
///
/// A record is created in `Draft` by a parish actor and terminates at
/// `Approved` (publicly visible) or `Rejected`. It may cycle between
/// `Pending`, `UnderReview`, and `NeedsRevision` indefinitely before
/// terminating. The status field only changes through the workflow
/// engine; no other code path writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurchStatus {
    Draft,
    Pending,
    UnderReview,
    HeritageReview,
    Approved,
    NeedsRevision,
    Rejected,
}

impl ChurchStatus {
    pub const ALL: [ChurchStatus; 7] = [
        ChurchStatus::Draft,
        ChurchStatus::Pending,
        ChurchStatus::UnderReview,
        ChurchStatus::HeritageReview,
        ChurchStatus::Approved,
        ChurchStatus::NeedsRevision,
        ChurchStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChurchStatus::Draft => "draft",
            ChurchStatus::Pending => "pending",
            ChurchStatus::UnderReview => "under_review",
            ChurchStatus::HeritageReview => "heritage_review",
            ChurchStatus::Approved => "approved",
            ChurchStatus::NeedsRevision => "needs_revision",
            ChurchStatus::Rejected => "rejected",
        }
    }

    /// Terminal states: no outgoing transition leads anywhere new except
    /// the explicit unpublish path out of `Approved`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChurchStatus::Rejected)
    }
}

impl fmt::Display for ChurchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staff role of an acting or viewing principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Church-level actor; one parish maps to one church record.
    Parish,
    /// Diocesan chancery staff; the primary review queue.
    DiocesanOffice,
    /// Secondary reviewer for heritage-declared churches.
    HeritageReviewer,
}

impl StaffRole {
    pub const ALL: [StaffRole; 3] = [
        StaffRole::Parish,
        StaffRole::DiocesanOffice,
        StaffRole::HeritageReviewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Parish => "parish",
            StaffRole::DiocesanOffice => "diocesan_office",
            StaffRole::HeritageReviewer => "heritage_reviewer",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two diocesan jurisdictions partitioning all churches and staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diocese {
    Tagbilaran,
    Talibon,
}

impl Diocese {
    pub fn as_str(&self) -> &'static str {
        match self {
            Diocese::Tagbilaran => "tagbilaran",
            Diocese::Talibon => "talibon",
        }
    }
}

impl fmt::Display for Diocese {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a church is heritage-designated. Declared churches route
/// through the heritage review stage before approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeritageClassification {
    Declared,
    NonDeclared,
}
