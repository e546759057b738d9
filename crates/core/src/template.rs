//! Per-kind message templates and `{placeholder}` interpolation.
//!
//! Templates are plain substitution, no conditionals. The set is a value
//! held by whoever dispatches notifications, so tests can construct
//! isolated instances with custom wording; there is no module-level
//! registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::notification::{NotificationType, Priority};

/// Title and message templates for one notification kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

impl Template {
    fn new(title: &str, message: &str, priority: Priority) -> Template {
        Template {
            title: title.to_string(),
            message: message.to_string(),
            priority,
        }
    }
}

/// The full per-kind template table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSet {
    templates: BTreeMap<NotificationType, Template>,
}

impl TemplateSet {
    /// An empty set; kinds without a template fall back to
    /// [`TemplateSet::fallback`] wording at dispatch time.
    pub fn empty() -> TemplateSet {
        TemplateSet {
            templates: BTreeMap::new(),
        }
    }

    pub fn with(mut self, kind: NotificationType, template: Template) -> TemplateSet {
        self.templates.insert(kind, template);
        self
    }

    pub fn get(&self, kind: NotificationType) -> Option<&Template> {
        self.templates.get(&kind)
    }

    /// Wording used when a kind has no registered template.
    pub fn fallback(kind: NotificationType) -> Template {
        Template::new(
            "Notification",
            &format!("You have a new {} notification.", kind.as_str()),
            Priority::Low,
        )
    }
}

impl Default for TemplateSet {
    /// The standard production table.
    fn default() -> TemplateSet {
        use NotificationType::*;
        TemplateSet::empty()
            .with(
                ChurchSubmitted,
                Template::new(
                    "Church submitted for review",
                    "{church_name} was submitted for review by {actor_name}.",
                    Priority::Medium,
                ),
            )
            .with(
                HeritageReviewAssigned,
                Template::new(
                    "Heritage review assigned",
                    "{church_name} was forwarded for heritage review by {actor_name}.",
                    Priority::High,
                ),
            )
            .with(
                HeritageValidated,
                Template::new(
                    "Heritage review completed",
                    "{church_name} passed heritage review and is now approved.",
                    Priority::Medium,
                ),
            )
            .with(
                ChurchApproved,
                Template::new(
                    "Church approved",
                    "{church_name} has been approved and is now publicly visible.",
                    Priority::Medium,
                ),
            )
            .with(
                RevisionRequested,
                Template::new(
                    "Revision requested",
                    "{actor_name} requested revisions for {church_name}: {note}",
                    Priority::High,
                ),
            )
            .with(
                ChurchUnpublished,
                Template::new(
                    "Church unpublished",
                    "{church_name} was unpublished by {actor_name}: {note}",
                    Priority::High,
                ),
            )
            .with(
                AccountPendingApproval,
                Template::new(
                    "New account pending approval",
                    "{applicant_name} registered and is awaiting approval.",
                    Priority::Medium,
                ),
            )
            .with(
                FeedbackReceived,
                Template::new(
                    "New feedback",
                    "{author_name} left feedback on {church_name}.",
                    Priority::Low,
                ),
            )
            .with(
                Announcement,
                Template::new("{title}", "{message}", Priority::Low),
            )
    }
}

/// Substitute `{placeholder}` occurrences from `bindings`.
///
/// Unknown placeholders are left intact rather than erased, so a missing
/// binding is visible in the rendered message instead of silently
/// producing a hole. A `{` without a closing `}` is copied through.
pub fn interpolate(template: &str, bindings: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        match rest[open..].find('}') {
            Some(close_rel) => {
                let key = &rest[open + 1..open + close_rel];
                match bindings.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[open..=open + close_rel]),
                }
                rest = &rest[open + close_rel + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}
