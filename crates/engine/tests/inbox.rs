//! Read-model, read-mark, bulk-clear, and failure-path behavior.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use vestry_core::{
    Actor, ChurchStatus, Diocese, HeritageClassification, NotificationType, StaffRole, ViewingUser,
};
use vestry_engine::{NotificationEngine, WorkflowService};
use vestry_storage::{
    ChurchRecord, ChurchStore, MemoryStore, NotificationRecord, NotificationStore, StorageError,
    MAX_BATCH_MUTATIONS,
};

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

fn viewer(uid: &str, role: StaffRole, diocese: Diocese, parish: Option<&str>) -> ViewingUser {
    ViewingUser {
        uid: uid.to_string(),
        role,
        diocese,
        parish_id: parish.map(str::to_string),
    }
}

fn office_viewer(uid: &str) -> ViewingUser {
    viewer(uid, StaffRole::DiocesanOffice, Diocese::Tagbilaran, None)
}

fn engine() -> (MemoryStore, NotificationEngine<MemoryStore>) {
    let store = MemoryStore::new();
    (store.clone(), NotificationEngine::new(Arc::new(store)))
}

/// Seed `n` office-targeted notifications through the public surface.
async fn seed_announcements(e: &NotificationEngine<MemoryStore>, n: usize) {
    for i in 0..n {
        let outcome = e
            .announce(&format!("notice {i}"), "body", Some(Diocese::Tagbilaran))
            .await;
        assert!(outcome.fully_delivered());
    }
}

// ──────────────────────────────────────────────
// Read marks
// ──────────────────────────────────────────────

#[tokio::test]
async fn mark_read_is_idempotent_and_monotonic() {
    let (store, e) = engine();
    seed_announcements(&e, 1).await;
    let id = e
        .resolve_visible(&office_viewer("u1"), 10, false)
        .await
        .unwrap()[0]
        .id
        .clone();

    e.mark_read(&id, "u1").await.unwrap();
    let after_first = store.get_notification(&id).unwrap().read_by;
    e.mark_read(&id, "u1").await.unwrap();
    let after_second = store.get_notification(&id).unwrap().read_by;
    assert_eq!(after_first, after_second);
    assert!(after_second.contains("u1"));

    // Resolution never removes a read marker.
    e.resolve_visible(&office_viewer("u1"), 10, true).await.unwrap();
    assert!(store.get_notification(&id).unwrap().read_by.contains("u1"));
}

#[tokio::test]
async fn unread_only_hides_read_records_per_viewer() {
    let (_store, e) = engine();
    seed_announcements(&e, 2).await;
    let all = e.resolve_visible(&office_viewer("u1"), 10, false).await.unwrap();
    assert_eq!(all.len(), 2);

    e.mark_read(&all[0].id, "u1").await.unwrap();
    let unread_u1 = e.resolve_visible(&office_viewer("u1"), 10, true).await.unwrap();
    assert_eq!(unread_u1.len(), 1);
    assert_eq!(unread_u1[0].id, all[1].id);

    // Another viewer's unread set is unaffected.
    let unread_u2 = e.resolve_visible(&office_viewer("u2"), 10, true).await.unwrap();
    assert_eq!(unread_u2.len(), 2);
}

#[tokio::test]
async fn mark_all_read_empties_the_unread_set() {
    let (_store, e) = engine();
    seed_announcements(&e, 3).await;

    let marked = e.mark_all_read(&office_viewer("u1")).await.unwrap();
    assert_eq!(marked, 3);
    let unread = e.resolve_visible(&office_viewer("u1"), 10, true).await.unwrap();
    assert!(unread.is_empty());

    // Repeat run finds nothing left to mark.
    assert_eq!(e.mark_all_read(&office_viewer("u1")).await.unwrap(), 0);
}

// ──────────────────────────────────────────────
// Resolution
// ──────────────────────────────────────────────

#[tokio::test]
async fn explicit_user_targeting_bypasses_diocese_narrowing() {
    let (store, e) = engine();
    // A record addressed to u1 personally, in the other diocese.
    store
        .insert(NotificationRecord {
            id: "direct-1".to_string(),
            kind: NotificationType::Announcement,
            priority: vestry_core::Priority::Low,
            title: "t".to_string(),
            message: "m".to_string(),
            recipients: vestry_core::Recipients::ByUser {
                user_ids: ["u1".to_string()].into_iter().collect(),
            },
            related_data: Default::default(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            read_by: Default::default(),
            action_url: "/announcements".to_string(),
        })
        .await
        .unwrap();

    let inbox = e
        .resolve_visible(&viewer("u1", StaffRole::Parish, Diocese::Talibon, Some("c9")), 10, false)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].id, "direct-1");
}

#[tokio::test]
async fn announcements_reach_every_parish_in_the_diocese() {
    let (_store, e) = engine();
    e.announce("maintenance window", "console down Sunday", Some(Diocese::Tagbilaran))
        .await;

    for parish in ["c1", "c2"] {
        let inbox = e
            .resolve_visible(
                &viewer(&format!("u-{parish}"), StaffRole::Parish, Diocese::Tagbilaran, Some(parish)),
                10,
                false,
            )
            .await
            .unwrap();
        assert_eq!(inbox.len(), 1, "parish {parish} should see the broadcast");
        assert_eq!(inbox[0].title, "maintenance window");
    }

    // But not parishes of the other diocese.
    let other = e
        .resolve_visible(
            &viewer("u9", StaffRole::Parish, Diocese::Talibon, Some("c9")),
            10,
            false,
        )
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn resolution_sorts_newest_first_and_truncates_to_page() {
    let (store, e) = engine();
    for (id, at) in [
        ("n-old", "2026-01-01T00:00:00Z"),
        ("n-new", "2026-01-03T00:00:00Z"),
        ("n-mid", "2026-01-02T00:00:00Z"),
    ] {
        store
            .insert(NotificationRecord {
                id: id.to_string(),
                kind: NotificationType::Announcement,
                priority: vestry_core::Priority::Low,
                title: "t".to_string(),
                message: "m".to_string(),
                recipients: vestry_core::Recipients::ByRole {
                    roles: [StaffRole::DiocesanOffice].into_iter().collect(),
                    dioceses: [Diocese::Tagbilaran].into_iter().collect(),
                },
                related_data: Default::default(),
                created_at: at.to_string(),
                read_by: Default::default(),
                action_url: "/announcements".to_string(),
            })
            .await
            .unwrap();
    }

    let page = e.resolve_visible(&office_viewer("u1"), 2, false).await.unwrap();
    let ids: Vec<&str> = page.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["n-new", "n-mid"]);
}

// ──────────────────────────────────────────────
// Failure paths
// ──────────────────────────────────────────────

/// Notification store that refuses every read with permission-denied.
struct DeniedStore(MemoryStore);

#[async_trait]
impl NotificationStore for DeniedStore {
    async fn insert(&self, record: NotificationRecord) -> Result<(), StorageError> {
        self.0.insert(record).await
    }
    async fn query_by_recipient_user(
        &self,
        _uid: &str,
        _limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        Err(StorageError::PermissionDenied {
            collection: "notifications".to_string(),
        })
    }
    async fn query_by_recipient_role(
        &self,
        _role: StaffRole,
        _limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        Err(StorageError::PermissionDenied {
            collection: "notifications".to_string(),
        })
    }
    async fn mark_read(&self, id: &str, uid: &str) -> Result<(), StorageError> {
        self.0.mark_read(id, uid).await
    }
    async fn delete_batch(&self, ids: &[String]) -> Result<(), StorageError> {
        self.0.delete_batch(ids).await
    }
}

#[tokio::test]
async fn permission_denied_resolution_degrades_to_empty() {
    let e = NotificationEngine::new(Arc::new(DeniedStore(MemoryStore::new())));
    let inbox = e.resolve_visible(&office_viewer("u1"), 10, false).await.unwrap();
    assert!(inbox.is_empty());
}

/// Notification store whose inserts always fail; church data untouched.
struct BrokenFanout(MemoryStore);

#[async_trait]
impl NotificationStore for BrokenFanout {
    async fn insert(&self, _record: NotificationRecord) -> Result<(), StorageError> {
        Err(StorageError::Backend("write quota exhausted".to_string()))
    }
    async fn query_by_recipient_user(
        &self,
        uid: &str,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        self.0.query_by_recipient_user(uid, limit).await
    }
    async fn query_by_recipient_role(
        &self,
        role: StaffRole,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        self.0.query_by_recipient_role(role, limit).await
    }
    async fn mark_read(&self, id: &str, uid: &str) -> Result<(), StorageError> {
        self.0.mark_read(id, uid).await
    }
    async fn delete_batch(&self, ids: &[String]) -> Result<(), StorageError> {
        self.0.delete_batch(ids).await
    }
}

#[tokio::test]
async fn fanout_failure_never_blocks_the_status_write() {
    let churches = MemoryStore::new();
    churches
        .put_church(ChurchRecord {
            id: "c1".to_string(),
            name: "Church c1".to_string(),
            status: ChurchStatus::Draft,
            diocese: Diocese::Tagbilaran,
            classification: HeritageClassification::NonDeclared,
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        })
        .await
        .unwrap();
    let broken = NotificationEngine::new(Arc::new(BrokenFanout(MemoryStore::new())));
    let service = WorkflowService::new(Arc::new(churches.clone()), Arc::new(broken));

    let updated = service
        .apply_transition(
            "c1",
            ChurchStatus::Pending,
            &Actor {
                id: "p1".to_string(),
                display_name: "User p1".to_string(),
                role: StaffRole::Parish,
            },
            None,
        )
        .await
        .unwrap();

    // The transition committed even though every insert failed.
    assert_eq!(updated.status, ChurchStatus::Pending);
    assert_eq!(
        churches.get_church("c1").await.unwrap().unwrap().status,
        ChurchStatus::Pending
    );
}

#[tokio::test]
async fn fanout_outcome_reports_swallowed_failures() {
    let e = NotificationEngine::new(Arc::new(BrokenFanout(MemoryStore::new())));
    let outcome = e.announce("t", "m", None).await;
    assert!(!outcome.fully_delivered());
    assert_eq!(outcome.created.len(), 0);
    assert_eq!(outcome.failures.len(), 1);
}

// ──────────────────────────────────────────────
// Bulk clear
// ──────────────────────────────────────────────

/// Counts delete batches on the way through to the real store.
struct CountingStore {
    inner: MemoryStore,
    batches: AtomicUsize,
}

#[async_trait]
impl NotificationStore for CountingStore {
    async fn insert(&self, record: NotificationRecord) -> Result<(), StorageError> {
        self.inner.insert(record).await
    }
    async fn query_by_recipient_user(
        &self,
        uid: &str,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        self.inner.query_by_recipient_user(uid, limit).await
    }
    async fn query_by_recipient_role(
        &self,
        role: StaffRole,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        self.inner.query_by_recipient_role(role, limit).await
    }
    async fn mark_read(&self, id: &str, uid: &str) -> Result<(), StorageError> {
        self.inner.mark_read(id, uid).await
    }
    async fn delete_batch(&self, ids: &[String]) -> Result<(), StorageError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_batch(ids).await
    }
}

#[tokio::test]
async fn clear_all_chunks_into_multiple_batches() {
    let counting = Arc::new(CountingStore {
        inner: MemoryStore::new(),
        batches: AtomicUsize::new(0),
    });
    let e = NotificationEngine::new(counting.clone());

    let total = MAX_BATCH_MUTATIONS + 100;
    for i in 0..total {
        counting
            .insert(NotificationRecord {
                id: format!("n{i}"),
                kind: NotificationType::Announcement,
                priority: vestry_core::Priority::Low,
                title: "t".to_string(),
                message: "m".to_string(),
                recipients: vestry_core::Recipients::ByRole {
                    roles: [StaffRole::DiocesanOffice].into_iter().collect(),
                    dioceses: Default::default(),
                },
                related_data: Default::default(),
                created_at: "2026-01-01T00:00:00Z".to_string(),
                read_by: Default::default(),
                action_url: "/announcements".to_string(),
            })
            .await
            .unwrap();
    }

    let deleted = e.clear_all(&office_viewer("u1")).await.unwrap();
    assert_eq!(deleted, total);
    assert_eq!(counting.batches.load(Ordering::SeqCst), 2);
    assert_eq!(counting.inner.notification_count(), 0);
}

#[tokio::test]
async fn clear_all_removes_only_the_viewers_visible_set() {
    let (store, e) = engine();
    e.announce("for tagbilaran", "m", Some(Diocese::Tagbilaran)).await;
    e.announce("for talibon", "m", Some(Diocese::Talibon)).await;

    let deleted = e.clear_all(&office_viewer("u1")).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.notification_count(), 1);

    let talibon_inbox = e
        .resolve_visible(
            &viewer("u2", StaffRole::DiocesanOffice, Diocese::Talibon, None),
            10,
            false,
        )
        .await
        .unwrap();
    assert_eq!(talibon_inbox.len(), 1);
    assert_eq!(talibon_inbox[0].title, "for talibon");
}

// ──────────────────────────────────────────────
// Direct events
// ──────────────────────────────────────────────

#[tokio::test]
async fn feedback_reaches_owning_parish_and_office_only() {
    let (_store, e) = engine();
    let outcome = e
        .notify_feedback_received("c1", "Church c1", Diocese::Tagbilaran, "A. Visitor")
        .await;
    assert!(outcome.fully_delivered());
    assert_eq!(outcome.created.len(), 2);

    let owner = e
        .resolve_visible(
            &viewer("p1", StaffRole::Parish, Diocese::Tagbilaran, Some("c1")),
            10,
            false,
        )
        .await
        .unwrap();
    assert_eq!(owner.len(), 1);
    assert_eq!(owner[0].kind, NotificationType::FeedbackReceived);
    assert_eq!(owner[0].action_url, "/feedback?church=c1");

    let neighbor = e
        .resolve_visible(
            &viewer("p2", StaffRole::Parish, Diocese::Tagbilaran, Some("c2")),
            10,
            false,
        )
        .await
        .unwrap();
    assert!(neighbor.is_empty());

    let office = e.resolve_visible(&office_viewer("o1"), 10, false).await.unwrap();
    assert_eq!(office.len(), 1);
}

#[tokio::test]
async fn account_registration_notifies_the_diocesan_office() {
    let (_store, e) = engine();
    e.notify_account_pending_approval("Fr. New", Diocese::Talibon).await;

    let office = e
        .resolve_visible(
            &viewer("o1", StaffRole::DiocesanOffice, Diocese::Talibon, None),
            10,
            false,
        )
        .await
        .unwrap();
    assert_eq!(office.len(), 1);
    assert_eq!(office[0].kind, NotificationType::AccountPendingApproval);
    assert!(office[0].message.contains("Fr. New"));
    assert_eq!(office[0].action_url, "/accounts");
}

#[tokio::test]
async fn unpublish_notice_is_scoped_to_the_owning_parish() {
    let (_store, e) = engine();
    e.notify_church_unpublished(
        "c1",
        "Church c1",
        Diocese::Tagbilaran,
        &Actor {
            id: "o1".to_string(),
            display_name: "User o1".to_string(),
            role: StaffRole::DiocesanOffice,
        },
        Some("license lapsed"),
    )
    .await;

    let owner = e
        .resolve_visible(
            &viewer("p1", StaffRole::Parish, Diocese::Tagbilaran, Some("c1")),
            10,
            false,
        )
        .await
        .unwrap();
    assert_eq!(owner.len(), 1);
    assert_eq!(owner[0].kind, NotificationType::ChurchUnpublished);
    assert!(owner[0].message.contains("license lapsed"));

    let neighbor = e
        .resolve_visible(
            &viewer("p2", StaffRole::Parish, Diocese::Tagbilaran, Some("c2")),
            10,
            false,
        )
        .await
        .unwrap();
    assert!(neighbor.is_empty());
}
