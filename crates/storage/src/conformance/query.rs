use std::future::Future;

use vestry_core::StaffRole;

use super::{make_notification, role_rule, user_rule, TestResult};
use crate::{ChurchStore, NotificationStore};

pub(super) async fn run_query_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "query",
        "role_query_matches_only_the_queried_role",
        role_query_matches_only_the_queried_role(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "role_query_orders_newest_first",
        role_query_orders_newest_first(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "role_query_respects_limit",
        role_query_respects_limit(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "role_query_does_not_narrow_by_diocese_or_parish",
        role_query_does_not_narrow_by_diocese_or_parish(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "user_query_matches_only_explicit_user_rules",
        user_query_matches_only_explicit_user_rules(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "empty_store_queries_return_empty",
        empty_store_queries_return_empty(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

/// A role query returns only records whose rule includes that role.
async fn role_query_matches_only_the_queried_role<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.insert(make_notification(
        "n-parish",
        "2026-01-01T00:00:00Z",
        role_rule(StaffRole::Parish),
    ))
    .await
    .map_err(|e| e.to_string())?;
    s.insert(make_notification(
        "n-office",
        "2026-01-01T00:00:00Z",
        role_rule(StaffRole::DiocesanOffice),
    ))
    .await
    .map_err(|e| e.to_string())?;

    let hits = s
        .query_by_recipient_role(StaffRole::Parish, 10)
        .await
        .map_err(|e| e.to_string())?;
    if hits.len() != 1 || hits[0].id != "n-parish" {
        return Err(format!("expected [n-parish], got {:?}", ids(&hits)));
    }
    Ok(())
}

/// Results come back created_at descending.
async fn role_query_orders_newest_first<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for (id, at) in [
        ("n1", "2026-01-01T00:00:00Z"),
        ("n2", "2026-01-03T00:00:00Z"),
        ("n3", "2026-01-02T00:00:00Z"),
    ] {
        s.insert(make_notification(id, at, role_rule(StaffRole::Parish)))
            .await
            .map_err(|e| e.to_string())?;
    }
    let hits = s
        .query_by_recipient_role(StaffRole::Parish, 10)
        .await
        .map_err(|e| e.to_string())?;
    if ids(&hits) != ["n2", "n3", "n1"] {
        return Err(format!("wrong order: {:?}", ids(&hits)));
    }
    Ok(())
}

/// The limit truncates after ordering, keeping the newest records.
async fn role_query_respects_limit<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for i in 0..5 {
        s.insert(make_notification(
            &format!("n{i}"),
            &format!("2026-01-0{}T00:00:00Z", i + 1),
            role_rule(StaffRole::Parish),
        ))
        .await
        .map_err(|e| e.to_string())?;
    }
    let hits = s
        .query_by_recipient_role(StaffRole::Parish, 2)
        .await
        .map_err(|e| e.to_string())?;
    if ids(&hits) != ["n4", "n3"] {
        return Err(format!("expected the 2 newest, got {:?}", ids(&hits)));
    }
    Ok(())
}

/// The store evaluates exactly one membership predicate: a role query
/// must return parish-narrowed rules for other parishes too. Diocese and
/// parish narrowing is the caller's job.
async fn role_query_does_not_narrow_by_diocese_or_parish<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    use vestry_core::{Diocese, Recipients};

    let s = factory().await;
    s.insert(make_notification(
        "n-a",
        "2026-01-01T00:00:00Z",
        Recipients::for_roles([StaffRole::Parish], Diocese::Tagbilaran, "church-a"),
    ))
    .await
    .map_err(|e| e.to_string())?;
    s.insert(make_notification(
        "n-b",
        "2026-01-01T00:00:01Z",
        Recipients::for_roles([StaffRole::Parish], Diocese::Talibon, "church-b"),
    ))
    .await
    .map_err(|e| e.to_string())?;

    let hits = s
        .query_by_recipient_role(StaffRole::Parish, 10)
        .await
        .map_err(|e| e.to_string())?;
    if hits.len() != 2 {
        return Err(format!(
            "expected both parish rules regardless of diocese/parish, got {:?}",
            ids(&hits)
        ));
    }
    Ok(())
}

/// A user query matches only explicit-user rules, never role rules.
async fn user_query_matches_only_explicit_user_rules<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.insert(make_notification(
        "n-role",
        "2026-01-01T00:00:00Z",
        role_rule(StaffRole::Parish),
    ))
    .await
    .map_err(|e| e.to_string())?;
    s.insert(make_notification("n-user", "2026-01-01T00:00:00Z", user_rule("u1")))
        .await
        .map_err(|e| e.to_string())?;

    let hits = s
        .query_by_recipient_user("u1", 10)
        .await
        .map_err(|e| e.to_string())?;
    if ids(&hits) != ["n-user"] {
        return Err(format!("expected [n-user], got {:?}", ids(&hits)));
    }
    let none = s
        .query_by_recipient_user("u2", 10)
        .await
        .map_err(|e| e.to_string())?;
    if !none.is_empty() {
        return Err(format!("expected no hits for u2, got {:?}", ids(&none)));
    }
    Ok(())
}

/// Fresh store, both queries empty.
async fn empty_store_queries_return_empty<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let by_user = s
        .query_by_recipient_user("u1", 10)
        .await
        .map_err(|e| e.to_string())?;
    let by_role = s
        .query_by_recipient_role(StaffRole::Parish, 10)
        .await
        .map_err(|e| e.to_string())?;
    if !by_user.is_empty() || !by_role.is_empty() {
        return Err("expected empty results from a fresh store".to_string());
    }
    Ok(())
}

fn ids(records: &[crate::NotificationRecord]) -> Vec<&str> {
    records.iter().map(|n| n.id.as_str()).collect()
}
