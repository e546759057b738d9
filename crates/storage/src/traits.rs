use async_trait::async_trait;

use vestry_core::{ChurchStatus, StaffRole};

use crate::error::StorageError;
use crate::record::{ChurchRecord, NotificationRecord};

/// Maximum number of record mutations the store accepts in one atomic
/// batch. Larger clear operations must be chunked into sequential
/// batches, each committed independently.
pub const MAX_BATCH_MUTATIONS: usize = 500;

/// Access to the church collection.
///
/// ## Concurrency
///
/// `set_status` is a single-field last-write-wins update. The store is
/// relied upon for that semantic; implementations take no lock and the
/// workflow engine does not retry on races. Two simultaneous transitions
/// may interleave, with the later write winning.
///
/// ## Thread safety
///
/// Implementations must be `Send + Sync + 'static` to be shared across
/// async task boundaries.
#[async_trait]
pub trait ChurchStore: Send + Sync + 'static {
    /// Fetch one church by id. `Ok(None)` when absent.
    async fn get_church(&self, id: &str) -> Result<Option<ChurchRecord>, StorageError>;

    /// Create or replace a church document.
    async fn put_church(&self, record: ChurchRecord) -> Result<(), StorageError>;

    /// Write the status field (last-write-wins) and return the updated
    /// record. `Err(NotFound)` when the church does not exist.
    async fn set_status(
        &self,
        id: &str,
        to: ChurchStatus,
        updated_at: &str,
    ) -> Result<ChurchRecord, StorageError>;
}

/// Access to the notification collection.
///
/// ## Query model
///
/// The backing store evaluates at most ONE array-membership predicate
/// per query, ordered by creation time descending with a limit. There is
/// deliberately no method combining a user filter with a role filter, or
/// a role filter with a diocese filter; the compound predicate cannot be
/// expressed server-side, so the read model issues two queries and
/// filters the role-derived results in process.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Persist one notification record. Each insert is independent;
    /// there is no multi-record insert and no transaction coupling an
    /// insert to any other write.
    async fn insert(&self, record: NotificationRecord) -> Result<(), StorageError>;

    /// Records whose rule names `uid` explicitly, newest first, at most
    /// `limit`.
    async fn query_by_recipient_user(
        &self,
        uid: &str,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError>;

    /// Records whose rule includes `role`, newest first, at most
    /// `limit`. Diocese and parish narrowing is NOT applied here; the
    /// caller over-fetches and filters.
    async fn query_by_recipient_role(
        &self,
        role: StaffRole,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError>;

    /// Add `uid` to the record's read set. Idempotent: marking an
    /// already-read record succeeds without change. `Err(NotFound)` for
    /// an unknown id.
    async fn mark_read(&self, id: &str, uid: &str) -> Result<(), StorageError>;

    /// Delete up to [`MAX_BATCH_MUTATIONS`] records in one atomic batch.
    /// Ids beyond the limit are a `BatchTooLarge` error, never a silent
    /// partial delete. Unknown ids within a batch are skipped.
    async fn delete_batch(&self, ids: &[String]) -> Result<(), StorageError>;
}
