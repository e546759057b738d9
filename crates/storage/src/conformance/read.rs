use std::future::Future;

use vestry_core::StaffRole;

use super::{make_notification, role_rule, TestResult};
use crate::{ChurchStore, NotificationStore, StorageError};

pub(super) async fn run_read_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "read",
        "mark_read_adds_the_viewer",
        mark_read_adds_the_viewer(factory).await,
    ));
    results.push(TestResult::from_result(
        "read",
        "mark_read_is_idempotent",
        mark_read_is_idempotent(factory).await,
    ));
    results.push(TestResult::from_result(
        "read",
        "read_set_grows_monotonically",
        read_set_grows_monotonically(factory).await,
    ));
    results.push(TestResult::from_result(
        "read",
        "mark_read_unknown_id_is_not_found",
        mark_read_unknown_id_is_not_found(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn insert_one<S>(s: &S) -> Result<(), String>
where
    S: NotificationStore,
{
    s.insert(make_notification(
        "n1",
        "2026-01-01T00:00:00Z",
        role_rule(StaffRole::Parish),
    ))
    .await
    .map_err(|e| e.to_string())
}

async fn fetch_one<S>(s: &S) -> Result<crate::NotificationRecord, String>
where
    S: NotificationStore,
{
    let hits = s
        .query_by_recipient_role(StaffRole::Parish, 10)
        .await
        .map_err(|e| e.to_string())?;
    hits.into_iter()
        .find(|n| n.id == "n1")
        .ok_or_else(|| "record n1 not found".to_string())
}

/// After mark_read, the viewer's uid is in the read set.
async fn mark_read_adds_the_viewer<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_one(&s).await?;
    s.mark_read("n1", "u1").await.map_err(|e| e.to_string())?;
    let record = fetch_one(&s).await?;
    if !record.is_read_by("u1") {
        return Err("u1 missing from read_by after mark_read".to_string());
    }
    Ok(())
}

/// A second identical mark_read succeeds and changes nothing.
async fn mark_read_is_idempotent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_one(&s).await?;
    s.mark_read("n1", "u1").await.map_err(|e| e.to_string())?;
    let first = fetch_one(&s).await?.read_by;
    s.mark_read("n1", "u1").await.map_err(|e| e.to_string())?;
    let second = fetch_one(&s).await?.read_by;
    if first != second {
        return Err(format!("read set changed on repeat mark: {first:?} -> {second:?}"));
    }
    Ok(())
}

/// Marks from different viewers accumulate; nothing removes an entry.
async fn read_set_grows_monotonically<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_one(&s).await?;
    for uid in ["u1", "u2", "u3", "u1"] {
        s.mark_read("n1", uid).await.map_err(|e| e.to_string())?;
    }
    let record = fetch_one(&s).await?;
    for uid in ["u1", "u2", "u3"] {
        if !record.is_read_by(uid) {
            return Err(format!("{uid} missing from read_by"));
        }
    }
    if record.read_by.len() != 3 {
        return Err(format!("expected 3 readers, got {}", record.read_by.len()));
    }
    Ok(())
}

async fn mark_read_unknown_id_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.mark_read("missing", "u1").await {
        Err(StorageError::NotFound { .. }) => Ok(()),
        Err(e) => Err(format!("expected NotFound, got {e}")),
        Ok(()) => Err("expected NotFound, got Ok".to_string()),
    }
}
