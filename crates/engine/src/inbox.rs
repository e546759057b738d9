//! Read-model resolution: which notifications does a viewer see.
//!
//! The store evaluates one array-membership predicate per query, so the
//! full recipient rule cannot be pushed down. Resolution issues two
//! queries (explicit-user and role), over-fetches the role query, and
//! applies the diocese/parish narrowing in process before sorting and
//! truncating to the requested page.

use vestry_core::{StaffRole, ViewingUser};
use vestry_storage::{NotificationRecord, NotificationStore, StorageError, MAX_BATCH_MUTATIONS};

use crate::fanout::NotificationEngine;

/// Role queries fetch this many times the requested page size to leave
/// room for records rejected by the in-process narrowing pass.
const ROLE_OVERFETCH_FACTOR: usize = 2;

/// Page cap used by the bulk operations, which act on the whole visible
/// set rather than one UI page.
const BULK_PAGE_SIZE: usize = 10_000;

impl<N: NotificationStore> NotificationEngine<N> {
    /// Resolve the notifications visible to `viewer`, newest first, at
    /// most `page_size`.
    ///
    /// Permission-denied reads degrade to an empty inbox rather than
    /// raising: an empty list is a safe default and must not block any
    /// other UI flow. Other storage errors propagate.
    pub async fn resolve_visible(
        &self,
        viewer: &ViewingUser,
        page_size: usize,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        let by_user = match self
            .store()
            .query_by_recipient_user(&viewer.uid, page_size)
            .await
        {
            Ok(records) => records,
            Err(StorageError::PermissionDenied { collection }) => {
                tracing::warn!(uid = %viewer.uid, %collection, "inbox read denied; degrading to empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let overfetch = page_size.saturating_mul(ROLE_OVERFETCH_FACTOR);
        let by_role = match self
            .store()
            .query_by_recipient_role(viewer.role, overfetch)
            .await
        {
            Ok(records) => records,
            Err(StorageError::PermissionDenied { collection }) => {
                tracing::warn!(uid = %viewer.uid, %collection, "inbox read denied; degrading to empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        // Merge by id. Explicit-user hits bypass the narrowing pass;
        // role hits must survive it.
        let mut merged: Vec<NotificationRecord> = Vec::new();
        for record in by_user {
            if !merged.iter().any(|r| r.id == record.id) {
                merged.push(record);
            }
        }
        for record in by_role {
            if merged.iter().any(|r| r.id == record.id) {
                continue;
            }
            if passes_secondary_filters(&record, viewer) {
                merged.push(record);
            }
        }

        if unread_only {
            merged.retain(|r| !r.is_read_by(&viewer.uid));
        }

        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        merged.truncate(page_size);
        Ok(merged)
    }

    /// Add the viewer to one record's read set. Idempotent.
    pub async fn mark_read(&self, notification_id: &str, uid: &str) -> Result<(), StorageError> {
        self.store().mark_read(notification_id, uid).await
    }

    /// Mark every currently visible unread notification as read.
    ///
    /// Resolution followed by N individual read marks; a failing mark is
    /// logged and skipped so one bad record cannot wedge the rest.
    /// Returns how many records were marked.
    pub async fn mark_all_read(&self, viewer: &ViewingUser) -> Result<usize, StorageError> {
        let unread = self.resolve_visible(viewer, BULK_PAGE_SIZE, true).await?;
        let mut marked = 0;
        for record in unread {
            match self.store().mark_read(&record.id, &viewer.uid).await {
                Ok(()) => marked += 1,
                Err(err) => {
                    tracing::warn!(notification_id = %record.id, error = %err, "mark-read failed; skipping record");
                }
            }
        }
        Ok(marked)
    }

    /// Delete the viewer's entire visible set.
    ///
    /// The store caps mutations per atomic batch, so the delete is
    /// chunked into sequential batches committed independently; partial
    /// progress survives a mid-operation failure. Returns how many
    /// records were deleted.
    pub async fn clear_all(&self, viewer: &ViewingUser) -> Result<usize, StorageError> {
        let visible = self.resolve_visible(viewer, BULK_PAGE_SIZE, false).await?;
        let ids: Vec<String> = visible.into_iter().map(|r| r.id).collect();
        let mut deleted = 0;
        for chunk in ids.chunks(MAX_BATCH_MUTATIONS) {
            self.store().delete_batch(chunk).await?;
            deleted += chunk.len();
        }
        Ok(deleted)
    }
}

/// The in-process half of recipient-rule evaluation, applied to records
/// that arrived via the role query.
fn passes_secondary_filters(record: &NotificationRecord, viewer: &ViewingUser) -> bool {
    // Diocese: an empty or absent set means every diocese.
    if let Some(dioceses) = record.recipients.dioceses() {
        if !dioceses.is_empty() && !dioceses.contains(&viewer.diocese) {
            return false;
        }
    }

    // Parish: only parish viewers, and only for per-church kinds.
    // Everything else stays diocese-wide so broadcasts reach every
    // parish.
    if viewer.role == StaffRole::Parish && record.kind.is_parish_scoped() {
        let target = record
            .recipients
            .parish_id()
            .or(record.related_data.church_id.as_deref());
        return match (target, viewer.parish_id.as_deref()) {
            (Some(t), Some(p)) => t == p,
            // A parish-scoped record with no resolvable target, or a
            // parish viewer with no parish, matches nothing.
            _ => false,
        };
    }

    true
}
