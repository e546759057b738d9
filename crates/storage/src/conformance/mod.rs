//! Conformance test suite for store implementations.
//!
//! A backend-agnostic suite that any [`ChurchStore`] + [`NotificationStore`]
//! implementation can run to verify correctness. The suite covers:
//!
//! - **Queries**: single-membership-predicate semantics, newest-first
//!   ordering, limit handling
//! - **Read marks**: idempotence and monotonic growth of `read_by`
//! - **Batches**: the per-batch mutation limit, unknown-id tolerance
//! - **Church status**: last-write-wins single-field update
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function
//! that creates a fresh, empty storage instance for each test:
//!
//! ```ignore
//! use vestry_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn firestore_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_firestore().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod batch;
mod church;
mod query;
mod read;

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;

use vestry_core::{
    ChurchStatus, Diocese, HeritageClassification, NotificationType, Priority, Recipients,
    StaffRole,
};

use crate::record::{ChurchRecord, NotificationRecord, RelatedData};
use crate::{ChurchStore, NotificationStore};

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "query", "read", "batch").
    pub category: String,
    /// Test name (e.g. "role_query_orders_newest_first").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` function is called once per test to create a fresh,
/// empty storage instance, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: ChurchStore + NotificationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(query::run_query_tests(&factory).await);
    results.extend(read::run_read_tests(&factory).await);
    results.extend(batch::run_batch_tests(&factory).await);
    results.extend(church::run_church_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers: record constructors with sensible defaults ──────────────────────

fn make_notification(id: &str, created_at: &str, recipients: Recipients) -> NotificationRecord {
    NotificationRecord {
        id: id.to_string(),
        kind: NotificationType::ChurchSubmitted,
        priority: Priority::Medium,
        title: "test title".to_string(),
        message: "test message".to_string(),
        recipients,
        related_data: RelatedData::default(),
        created_at: created_at.to_string(),
        read_by: BTreeSet::new(),
        action_url: "/review".to_string(),
    }
}

fn role_rule(role: StaffRole) -> Recipients {
    Recipients::for_roles([role], Diocese::Tagbilaran, "church-1")
}

fn user_rule(uid: &str) -> Recipients {
    Recipients::ByUser {
        user_ids: [uid.to_string()].into_iter().collect(),
    }
}

fn make_church(id: &str, status: ChurchStatus) -> ChurchRecord {
    ChurchRecord {
        id: id.to_string(),
        name: "Test Church".to_string(),
        status,
        diocese: Diocese::Tagbilaran,
        classification: HeritageClassification::NonDeclared,
        updated_at: "2026-01-01T00:00:00Z".to_string(),
    }
}
