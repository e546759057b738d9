//! In-memory store backend.
//!
//! Implements both store traits over `Arc<Mutex<_>>` shared state,
//! honoring the same query constraints as the hosted backend (one
//! membership predicate, newest-first ordering, limit, bounded batches).
//! Used as the fixture store by the engine tests and suitable for any
//! downstream test harness.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use vestry_core::{ChurchStatus, Recipients, StaffRole};

use crate::error::StorageError;
use crate::record::{ChurchRecord, NotificationRecord};
use crate::traits::{ChurchStore, NotificationStore, MAX_BATCH_MUTATIONS};

#[derive(Default)]
struct Inner {
    churches: BTreeMap<String, ChurchRecord>,
    /// Insertion sequence paired with each record; breaks created_at
    /// ties so ordering is stable.
    notifications: Vec<(u64, NotificationRecord)>,
    next_seq: u64,
}

/// Shared-state in-memory implementation of both store traits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }

    /// Total number of stored notifications, read marks included.
    /// Test-facing convenience.
    pub fn notification_count(&self) -> usize {
        self.inner.lock().map(|i| i.notifications.len()).unwrap_or(0)
    }

    /// Fetch one notification by id. Test-facing convenience; the
    /// hosted store exposes this but the engine never needs it.
    pub fn get_notification(&self, id: &str) -> Option<NotificationRecord> {
        let inner = self.inner.lock().ok()?;
        inner
            .notifications
            .iter()
            .find(|(_, n)| n.id == id)
            .map(|(_, n)| n.clone())
    }
}

/// Newest first: created_at descending, then insertion order descending.
fn sort_newest_first(records: &mut [(u64, NotificationRecord)]) {
    records.sort_by(|(seq_a, a), (seq_b, b)| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| seq_b.cmp(seq_a))
    });
}

#[async_trait]
impl ChurchStore for MemoryStore {
    async fn get_church(&self, id: &str) -> Result<Option<ChurchRecord>, StorageError> {
        Ok(self.lock()?.churches.get(id).cloned())
    }

    async fn put_church(&self, record: ChurchRecord) -> Result<(), StorageError> {
        self.lock()?.churches.insert(record.id.clone(), record);
        Ok(())
    }

    async fn set_status(
        &self,
        id: &str,
        to: ChurchStatus,
        updated_at: &str,
    ) -> Result<ChurchRecord, StorageError> {
        let mut inner = self.lock()?;
        let record = inner
            .churches
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound {
                collection: "churches".to_string(),
                id: id.to_string(),
            })?;
        record.status = to;
        record.updated_at = updated_at.to_string();
        Ok(record.clone())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, record: NotificationRecord) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.notifications.push((seq, record));
        Ok(())
    }

    async fn query_by_recipient_user(
        &self,
        uid: &str,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        let inner = self.lock()?;
        let mut hits: Vec<(u64, NotificationRecord)> = inner
            .notifications
            .iter()
            .filter(|(_, n)| match &n.recipients {
                Recipients::ByUser { user_ids } => user_ids.contains(uid),
                _ => false,
            })
            .cloned()
            .collect();
        sort_newest_first(&mut hits);
        hits.truncate(limit);
        Ok(hits.into_iter().map(|(_, n)| n).collect())
    }

    async fn query_by_recipient_role(
        &self,
        role: StaffRole,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        let inner = self.lock()?;
        let mut hits: Vec<(u64, NotificationRecord)> = inner
            .notifications
            .iter()
            .filter(|(_, n)| n.recipients.roles().is_some_and(|roles| roles.contains(&role)))
            .cloned()
            .collect();
        sort_newest_first(&mut hits);
        hits.truncate(limit);
        Ok(hits.into_iter().map(|(_, n)| n).collect())
    }

    async fn mark_read(&self, id: &str, uid: &str) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        let record = inner
            .notifications
            .iter_mut()
            .find(|(_, n)| n.id == id)
            .map(|(_, n)| n)
            .ok_or_else(|| StorageError::NotFound {
                collection: "notifications".to_string(),
                id: id.to_string(),
            })?;
        record.read_by.insert(uid.to_string());
        Ok(())
    }

    async fn delete_batch(&self, ids: &[String]) -> Result<(), StorageError> {
        if ids.len() > MAX_BATCH_MUTATIONS {
            return Err(StorageError::BatchTooLarge {
                requested: ids.len(),
                max: MAX_BATCH_MUTATIONS,
            });
        }
        let mut inner = self.lock()?;
        inner.notifications.retain(|(_, n)| !ids.contains(&n.id));
        Ok(())
    }
}
