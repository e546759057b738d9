use std::future::Future;

use vestry_core::ChurchStatus;

use super::{make_church, TestResult};
use crate::{ChurchStore, NotificationStore, StorageError};

pub(super) async fn run_church_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "church",
        "put_then_get_round_trips",
        put_then_get_round_trips(factory).await,
    ));
    results.push(TestResult::from_result(
        "church",
        "set_status_updates_only_status_and_timestamp",
        set_status_updates_only_status_and_timestamp(factory).await,
    ));
    results.push(TestResult::from_result(
        "church",
        "set_status_is_last_write_wins",
        set_status_is_last_write_wins(factory).await,
    ));
    results.push(TestResult::from_result(
        "church",
        "set_status_on_missing_church_is_not_found",
        set_status_on_missing_church_is_not_found(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn put_then_get_round_trips<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let church = make_church("c1", ChurchStatus::Draft);
    s.put_church(church.clone()).await.map_err(|e| e.to_string())?;
    let got = s
        .get_church("c1")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("church c1 not found after put")?;
    if got != church {
        return Err("round trip changed the record".to_string());
    }
    Ok(())
}

async fn set_status_updates_only_status_and_timestamp<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let church = make_church("c1", ChurchStatus::Draft);
    s.put_church(church.clone()).await.map_err(|e| e.to_string())?;
    let updated = s
        .set_status("c1", ChurchStatus::Pending, "2026-02-01T00:00:00Z")
        .await
        .map_err(|e| e.to_string())?;
    if updated.status != ChurchStatus::Pending {
        return Err(format!("expected pending, got {}", updated.status));
    }
    if updated.updated_at != "2026-02-01T00:00:00Z" {
        return Err("timestamp not updated".to_string());
    }
    if updated.name != church.name || updated.diocese != church.diocese {
        return Err("set_status must not touch other fields".to_string());
    }
    Ok(())
}

/// No version check, no lock: the later write wins unconditionally.
async fn set_status_is_last_write_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put_church(make_church("c1", ChurchStatus::Pending))
        .await
        .map_err(|e| e.to_string())?;
    s.set_status("c1", ChurchStatus::UnderReview, "2026-02-01T00:00:00Z")
        .await
        .map_err(|e| e.to_string())?;
    s.set_status("c1", ChurchStatus::Pending, "2026-02-01T00:00:01Z")
        .await
        .map_err(|e| e.to_string())?;
    let got = s
        .get_church("c1")
        .await
        .map_err(|e| e.to_string())?
        .ok_or("church c1 missing")?;
    if got.status != ChurchStatus::Pending {
        return Err(format!("later write should win, got {}", got.status));
    }
    Ok(())
}

async fn set_status_on_missing_church_is_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s
        .set_status("ghost", ChurchStatus::Pending, "2026-02-01T00:00:00Z")
        .await
    {
        Err(StorageError::NotFound { .. }) => Ok(()),
        Err(e) => Err(format!("expected NotFound, got {e}")),
        Ok(_) => Err("expected NotFound, got Ok".to_string()),
    }
}
