//! The workflow service: legality check, status write, fan-out hand-off.
//!
//! The status write is the single source of truth. It commits (or
//! fails) on its own; fan-out runs after it and its outcome is logged
//! and discarded. There is no lock on the status field: two racing
//! transitions both fan out, and the later status write wins.

use std::sync::Arc;

use vestry_core::{
    classify_transition, is_legal_transition, Actor, ChurchStatus, StaffRole,
    TransitionDescriptor, TransitionKind,
};
use vestry_storage::{ChurchRecord, ChurchStore, NotificationStore, StorageError};

use crate::fanout::{now_iso8601, NotificationEngine};

/// Why a requested transition was rejected. The church record is left
/// unchanged in every error case.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("church not found: {church_id}")]
    ChurchNotFound { church_id: String },

    #[error("illegal transition {from} -> {to} for role {role}")]
    IllegalMove {
        from: ChurchStatus,
        to: ChurchStatus,
        role: StaffRole,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The approval workflow over a church store, with notifications fanned
/// out through an injected engine instance.
pub struct WorkflowService<C, N> {
    churches: Arc<C>,
    notifications: Arc<NotificationEngine<N>>,
}

impl<C, N> WorkflowService<C, N>
where
    C: ChurchStore,
    N: NotificationStore,
{
    pub fn new(churches: Arc<C>, notifications: Arc<NotificationEngine<N>>) -> Self {
        WorkflowService {
            churches,
            notifications,
        }
    }

    /// Validate and apply a status transition, then fan out best-effort
    /// notifications for it.
    ///
    /// Rejections (unknown church, move not in the legality table) are
    /// surfaced synchronously with the record untouched. Notification
    /// failures never surface here: by the time fan-out runs, the
    /// status write is already committed and stands.
    pub async fn apply_transition(
        &self,
        church_id: &str,
        to: ChurchStatus,
        actor: &Actor,
        note: Option<String>,
    ) -> Result<ChurchRecord, TransitionError> {
        let church = self
            .churches
            .get_church(church_id)
            .await?
            .ok_or_else(|| TransitionError::ChurchNotFound {
                church_id: church_id.to_string(),
            })?;
        let from = church.status;

        if !is_legal_transition(from, to, actor.role) {
            return Err(TransitionError::IllegalMove {
                from,
                to,
                role: actor.role,
            });
        }

        let updated = self.churches.set_status(church_id, to, &now_iso8601()).await?;

        let kind = classify_transition(from, to, actor.role);
        tracing::info!(
            church_id,
            from = from.as_str(),
            to = to.as_str(),
            role = actor.role.as_str(),
            kind = ?kind,
            "status transition applied"
        );

        if kind != TransitionKind::Unclassified {
            let descriptor = TransitionDescriptor {
                church_id: updated.id.clone(),
                church_name: updated.name.clone(),
                from_status: from,
                to_status: to,
                actor: actor.clone(),
                diocese: updated.diocese,
                note,
            };
            // Best-effort side channel: failures were already logged
            // inside the engine, the outcome is dropped on purpose.
            let _ = self.notifications.dispatch_transition(&descriptor).await;
        }

        Ok(updated)
    }

    pub fn notifications(&self) -> &NotificationEngine<N> {
        &self.notifications
    }
}
