//! Notification derivation and best-effort persistence.
//!
//! A transition descriptor is turned into zero or more notification
//! records via the static routing table, each rendered against the
//! engine's template set and persisted independently. One failed insert
//! does not stop the others, and no failure here ever reaches the
//! workflow path that produced the descriptor.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use vestry_core::{
    action_url, classify_transition, interpolate, routes_for, Actor, Diocese, NotificationType,
    Recipients, StaffRole, TemplateSet, TransitionDescriptor, TransitionKind,
};
use vestry_storage::{NotificationRecord, NotificationStore, RelatedData, StorageError};

/// Result of one fan-out: ids persisted and the failures that were
/// swallowed. Failures are explicit values here so the never-block
/// contract is visible in the signature instead of hidden in a catch;
/// the engine logs them at `warn` and callers discard the outcome.
#[derive(Debug, Default)]
pub struct FanoutOutcome {
    pub created: Vec<String>,
    pub failures: Vec<(String, StorageError)>,
}

impl FanoutOutcome {
    pub fn fully_delivered(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The fan-out engine. Explicitly constructed with its template table
/// (no module-level registry), so tests can supply isolated instances.
pub struct NotificationEngine<N> {
    store: Arc<N>,
    templates: TemplateSet,
    seq: AtomicU64,
}

impl<N: NotificationStore> NotificationEngine<N> {
    pub fn new(store: Arc<N>) -> NotificationEngine<N> {
        NotificationEngine::with_templates(store, TemplateSet::default())
    }

    pub fn with_templates(store: Arc<N>, templates: TemplateSet) -> NotificationEngine<N> {
        NotificationEngine {
            store,
            templates,
            seq: AtomicU64::new(0),
        }
    }

    pub(crate) fn store(&self) -> &N {
        &self.store
    }

    fn next_id(&self, kind: NotificationType) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let ts = time::OffsetDateTime::now_utc().unix_timestamp();
        format!("ntf-{}-{ts}-{seq}", kind.as_str())
    }

    /// Render one record for a routing row against a descriptor.
    fn build_record(
        &self,
        kind: NotificationType,
        roles: &[StaffRole],
        descriptor: &TransitionDescriptor,
    ) -> NotificationRecord {
        let bindings = transition_bindings(descriptor);
        let template = self
            .templates
            .get(kind)
            .cloned()
            .unwrap_or_else(|| TemplateSet::fallback(kind));
        NotificationRecord {
            id: self.next_id(kind),
            kind,
            priority: template.priority,
            title: interpolate(&template.title, &bindings),
            message: interpolate(&template.message, &bindings),
            recipients: Recipients::for_roles(
                roles.iter().copied(),
                descriptor.diocese,
                &descriptor.church_id,
            ),
            related_data: RelatedData {
                church_id: Some(descriptor.church_id.clone()),
                church_name: Some(descriptor.church_name.clone()),
                from_status: Some(descriptor.from_status),
                to_status: Some(descriptor.to_status),
                actor_id: Some(descriptor.actor.id.clone()),
                actor_name: Some(descriptor.actor.display_name.clone()),
                note: descriptor.note.clone(),
            },
            created_at: now_iso8601(),
            read_by: Default::default(),
            action_url: action_url(kind, Some(&descriptor.church_id)),
        }
    }

    /// Derive the records a transition produces, without persisting.
    pub fn derive_transition_records(
        &self,
        descriptor: &TransitionDescriptor,
    ) -> Vec<NotificationRecord> {
        let kind = classify_transition(
            descriptor.from_status,
            descriptor.to_status,
            descriptor.actor.role,
        );
        self.derive_for_kind(kind, descriptor)
    }

    fn derive_for_kind(
        &self,
        kind: TransitionKind,
        descriptor: &TransitionDescriptor,
    ) -> Vec<NotificationRecord> {
        routes_for(kind)
            .iter()
            .map(|(ntype, roles)| self.build_record(*ntype, roles, descriptor))
            .collect()
    }

    /// Derive and persist the notifications for an applied transition.
    ///
    /// Each insert is independent; a failure persisting one record does
    /// not prevent persisting the others. Failures are logged at `warn`
    /// and returned, never raised.
    pub async fn dispatch_transition(&self, descriptor: &TransitionDescriptor) -> FanoutOutcome {
        let records = self.derive_transition_records(descriptor);
        self.persist_all(records).await
    }

    async fn persist_all(&self, records: Vec<NotificationRecord>) -> FanoutOutcome {
        let mut outcome = FanoutOutcome::default();
        for record in records {
            let id = record.id.clone();
            let kind = record.kind;
            match self.store.insert(record).await {
                Ok(()) => outcome.created.push(id),
                Err(err) => {
                    tracing::warn!(
                        notification_id = %id,
                        kind = kind.as_str(),
                        error = %err,
                        "notification delivery failed; continuing, the originating write stands"
                    );
                    outcome.failures.push((id, err));
                }
            }
        }
        outcome
    }

    // ── Direct (non-transition) events ────────────────────────────────

    /// New visitor feedback on a church: the parish hears about its own
    /// church, the diocesan office hears diocese-wide.
    pub async fn notify_feedback_received(
        &self,
        church_id: &str,
        church_name: &str,
        diocese: Diocese,
        author_name: &str,
    ) -> FanoutOutcome {
        let bindings = direct_bindings(&[
            ("church_name", church_name),
            ("author_name", author_name),
        ]);
        let related = RelatedData {
            church_id: Some(church_id.to_string()),
            church_name: Some(church_name.to_string()),
            ..Default::default()
        };
        let records = vec![
            self.direct_record(
                NotificationType::FeedbackReceived,
                Recipients::for_roles([StaffRole::Parish], diocese, church_id),
                &bindings,
                related.clone(),
                Some(church_id),
            ),
            self.direct_record(
                NotificationType::FeedbackReceived,
                Recipients::for_roles([StaffRole::DiocesanOffice], diocese, church_id),
                &bindings,
                related,
                Some(church_id),
            ),
        ];
        self.persist_all(records).await
    }

    /// A new staff account registered and awaits diocesan approval.
    pub async fn notify_account_pending_approval(
        &self,
        applicant_name: &str,
        diocese: Diocese,
    ) -> FanoutOutcome {
        let bindings = direct_bindings(&[("applicant_name", applicant_name)]);
        let record = self.direct_record(
            NotificationType::AccountPendingApproval,
            Recipients::ByRole {
                roles: [StaffRole::DiocesanOffice].into_iter().collect(),
                dioceses: [diocese].into_iter().collect(),
            },
            &bindings,
            RelatedData {
                actor_name: Some(applicant_name.to_string()),
                ..Default::default()
            },
            None,
        );
        self.persist_all(vec![record]).await
    }

    /// A previously approved church was taken off public view.
    pub async fn notify_church_unpublished(
        &self,
        church_id: &str,
        church_name: &str,
        diocese: Diocese,
        actor: &Actor,
        reason: Option<&str>,
    ) -> FanoutOutcome {
        let note = reason.unwrap_or_default().to_string();
        let bindings = direct_bindings(&[
            ("church_name", church_name),
            ("actor_name", &actor.display_name),
            ("note", &note),
        ]);
        let record = self.direct_record(
            NotificationType::ChurchUnpublished,
            Recipients::for_roles([StaffRole::Parish], diocese, church_id),
            &bindings,
            RelatedData {
                church_id: Some(church_id.to_string()),
                church_name: Some(church_name.to_string()),
                actor_id: Some(actor.id.clone()),
                actor_name: Some(actor.display_name.clone()),
                note: reason.map(str::to_string),
                ..Default::default()
            },
            Some(church_id),
        );
        self.persist_all(vec![record]).await
    }

    /// Diocese-wide (or platform-wide, when `diocese` is `None`)
    /// broadcast to every role. Deliberately not parish-scoped: every
    /// parish in the targeted dioceses sees it.
    pub async fn announce(
        &self,
        title: &str,
        message: &str,
        diocese: Option<Diocese>,
    ) -> FanoutOutcome {
        let bindings = direct_bindings(&[("title", title), ("message", message)]);
        let record = self.direct_record(
            NotificationType::Announcement,
            Recipients::ByRole {
                roles: StaffRole::ALL.into_iter().collect(),
                dioceses: diocese.into_iter().collect(),
            },
            &bindings,
            RelatedData::default(),
            None,
        );
        self.persist_all(vec![record]).await
    }

    fn direct_record(
        &self,
        kind: NotificationType,
        recipients: Recipients,
        bindings: &BTreeMap<&str, String>,
        related_data: RelatedData,
        church_id: Option<&str>,
    ) -> NotificationRecord {
        let template = self
            .templates
            .get(kind)
            .cloned()
            .unwrap_or_else(|| TemplateSet::fallback(kind));
        NotificationRecord {
            id: self.next_id(kind),
            kind,
            priority: template.priority,
            title: interpolate(&template.title, bindings),
            message: interpolate(&template.message, bindings),
            recipients,
            related_data,
            created_at: now_iso8601(),
            read_by: Default::default(),
            action_url: action_url(kind, church_id),
        }
    }
}

fn transition_bindings(descriptor: &TransitionDescriptor) -> BTreeMap<&'static str, String> {
    let mut bindings = BTreeMap::new();
    bindings.insert("church_id", descriptor.church_id.clone());
    bindings.insert("church_name", descriptor.church_name.clone());
    bindings.insert("actor_name", descriptor.actor.display_name.clone());
    bindings.insert("actor_role", descriptor.actor.role.to_string());
    bindings.insert("from_status", descriptor.from_status.to_string());
    bindings.insert("to_status", descriptor.to_status.to_string());
    bindings.insert("diocese", descriptor.diocese.to_string());
    bindings.insert("note", descriptor.note.clone().unwrap_or_default());
    bindings
}

fn direct_bindings<'a>(pairs: &[(&'a str, &str)]) -> BTreeMap<&'a str, String> {
    pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
}

/// Generate a simple ISO 8601 timestamp.
pub(crate) fn now_iso8601() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vestry_core::{ChurchStatus, Template, TransitionKind};

    fn descriptor(
        from: ChurchStatus,
        to: ChurchStatus,
        role: StaffRole,
        note: Option<&str>,
    ) -> TransitionDescriptor {
        TransitionDescriptor {
            church_id: "c1".to_string(),
            church_name: "San Pedro".to_string(),
            from_status: from,
            to_status: to,
            actor: Actor {
                id: "u1".to_string(),
                display_name: "Fr. Cruz".to_string(),
                role,
            },
            diocese: Diocese::Tagbilaran,
            note: note.map(str::to_string),
        }
    }

    fn engine() -> NotificationEngine<vestry_storage::MemoryStore> {
        NotificationEngine::new(Arc::new(vestry_storage::MemoryStore::new()))
    }

    #[test]
    fn submission_derives_one_office_record() {
        let records = engine().derive_transition_records(&descriptor(
            ChurchStatus::Draft,
            ChurchStatus::Pending,
            StaffRole::Parish,
            None,
        ));
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.kind, NotificationType::ChurchSubmitted);
        assert_eq!(record.recipients.parish_id(), None);
        assert!(record
            .recipients
            .roles()
            .unwrap()
            .contains(&StaffRole::DiocesanOffice));
        assert!(record.message.contains("San Pedro"));
        assert!(record.message.contains("Fr. Cruz"));
        assert_eq!(record.action_url, "/review?church=c1");
    }

    #[test]
    fn heritage_validation_derives_two_records() {
        let records = engine().derive_transition_records(&descriptor(
            ChurchStatus::HeritageReview,
            ChurchStatus::Approved,
            StaffRole::HeritageReviewer,
            None,
        ));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, NotificationType::HeritageValidated);
        assert_eq!(records[0].recipients.parish_id(), None);
        assert_eq!(records[1].kind, NotificationType::ChurchApproved);
        // The parish channel is scoped to the originating church.
        assert_eq!(records[1].recipients.parish_id(), Some("c1"));
    }

    #[test]
    fn revision_request_interpolates_the_note() {
        let records = engine().derive_transition_records(&descriptor(
            ChurchStatus::UnderReview,
            ChurchStatus::Pending,
            StaffRole::DiocesanOffice,
            Some("add construction year"),
        ));
        assert_eq!(records.len(), 1);
        assert!(records[0].message.contains("add construction year"));
        assert_eq!(records[0].recipients.parish_id(), Some("c1"));
    }

    #[test]
    fn unclassified_transition_derives_nothing() {
        let records = engine().derive_transition_records(&descriptor(
            ChurchStatus::UnderReview,
            ChurchStatus::NeedsRevision,
            StaffRole::DiocesanOffice,
            None,
        ));
        assert!(records.is_empty());
    }

    #[test]
    fn record_ids_are_unique_within_an_engine() {
        let e = engine();
        let d = descriptor(
            ChurchStatus::HeritageReview,
            ChurchStatus::Approved,
            StaffRole::HeritageReviewer,
            None,
        );
        let a = e.derive_transition_records(&d);
        let b = e.derive_transition_records(&d);
        let mut ids: Vec<&str> = a.iter().chain(b.iter()).map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn injected_templates_override_the_stock_table() {
        let custom = TemplateSet::empty().with(
            NotificationType::ChurchSubmitted,
            Template {
                title: "queue: {church_name}".to_string(),
                message: "review {church_id}".to_string(),
                priority: vestry_core::Priority::Urgent,
            },
        );
        let e = NotificationEngine::with_templates(
            Arc::new(vestry_storage::MemoryStore::new()),
            custom,
        );
        let records = e.derive_transition_records(&descriptor(
            ChurchStatus::Draft,
            ChurchStatus::Pending,
            StaffRole::Parish,
            None,
        ));
        assert_eq!(records[0].title, "queue: San Pedro");
        assert_eq!(records[0].message, "review c1");
        assert_eq!(records[0].priority, vestry_core::Priority::Urgent);
    }

    #[test]
    fn missing_template_falls_back_instead_of_skipping() {
        let e = NotificationEngine::with_templates(
            Arc::new(vestry_storage::MemoryStore::new()),
            TemplateSet::empty(),
        );
        let records = e.derive_transition_records(&descriptor(
            ChurchStatus::Draft,
            ChurchStatus::Pending,
            StaffRole::Parish,
            None,
        ));
        assert_eq!(records.len(), 1);
        assert!(records[0].message.contains("church_submitted"));
    }

    #[test]
    fn routing_covers_every_classified_kind() {
        for kind in [
            TransitionKind::SubmittedForReview,
            TransitionKind::ForwardedToHeritageReview,
            TransitionKind::HeritageValidated,
            TransitionKind::ApprovedDirectly,
            TransitionKind::RevisionRequested,
        ] {
            assert!(
                !vestry_core::routes_for(kind).is_empty(),
                "no routes for {kind:?}"
            );
        }
    }
}
