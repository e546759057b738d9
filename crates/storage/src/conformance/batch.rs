use std::future::Future;

use vestry_core::StaffRole;

use super::{make_notification, role_rule, TestResult};
use crate::{ChurchStore, NotificationStore, StorageError, MAX_BATCH_MUTATIONS};

pub(super) async fn run_batch_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "batch",
        "delete_batch_removes_named_records",
        delete_batch_removes_named_records(factory).await,
    ));
    results.push(TestResult::from_result(
        "batch",
        "delete_batch_tolerates_unknown_ids",
        delete_batch_tolerates_unknown_ids(factory).await,
    ));
    results.push(TestResult::from_result(
        "batch",
        "oversized_batch_is_rejected_without_partial_delete",
        oversized_batch_is_rejected_without_partial_delete(factory).await,
    ));
    results.push(TestResult::from_result(
        "batch",
        "batch_at_exact_limit_is_accepted",
        batch_at_exact_limit_is_accepted(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn insert_n<S>(s: &S, n: usize) -> Result<(), String>
where
    S: NotificationStore,
{
    for i in 0..n {
        s.insert(make_notification(
            &format!("n{i}"),
            "2026-01-01T00:00:00Z",
            role_rule(StaffRole::Parish),
        ))
        .await
        .map_err(|e| e.to_string())?;
    }
    Ok(())
}

async fn count<S>(s: &S) -> Result<usize, String>
where
    S: NotificationStore,
{
    Ok(s.query_by_recipient_role(StaffRole::Parish, usize::MAX)
        .await
        .map_err(|e| e.to_string())?
        .len())
}

async fn delete_batch_removes_named_records<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_n(&s, 3).await?;
    s.delete_batch(&["n0".to_string(), "n2".to_string()])
        .await
        .map_err(|e| e.to_string())?;
    let remaining = s
        .query_by_recipient_role(StaffRole::Parish, 10)
        .await
        .map_err(|e| e.to_string())?;
    if remaining.len() != 1 || remaining[0].id != "n1" {
        return Err(format!(
            "expected only n1 to remain, got {:?}",
            remaining.iter().map(|n| &n.id).collect::<Vec<_>>()
        ));
    }
    Ok(())
}

/// Unknown ids in a batch are skipped, not errors. A bulk clear built
/// from a stale read must still succeed.
async fn delete_batch_tolerates_unknown_ids<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_n(&s, 1).await?;
    s.delete_batch(&["n0".to_string(), "ghost".to_string()])
        .await
        .map_err(|e| e.to_string())?;
    if count(&s).await? != 0 {
        return Err("n0 should have been deleted".to_string());
    }
    Ok(())
}

async fn oversized_batch_is_rejected_without_partial_delete<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    insert_n(&s, 2).await?;
    let ids: Vec<String> = (0..=MAX_BATCH_MUTATIONS).map(|i| format!("n{i}")).collect();
    match s.delete_batch(&ids).await {
        Err(StorageError::BatchTooLarge { requested, max }) => {
            if requested != MAX_BATCH_MUTATIONS + 1 || max != MAX_BATCH_MUTATIONS {
                return Err(format!("wrong limit fields: requested={requested}, max={max}"));
            }
        }
        Err(e) => return Err(format!("expected BatchTooLarge, got {e}")),
        Ok(()) => return Err("expected BatchTooLarge, got Ok".to_string()),
    }
    if count(&s).await? != 2 {
        return Err("oversized batch must not partially delete".to_string());
    }
    Ok(())
}

async fn batch_at_exact_limit_is_accepted<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let ids: Vec<String> = (0..MAX_BATCH_MUTATIONS).map(|i| format!("n{i}")).collect();
    s.delete_batch(&ids).await.map_err(|e| e.to_string())
}
