//! vestry-engine: the approval workflow service and notification
//! fan-out engine, composed over `vestry-core` + `vestry-storage`.
//!
//! Two components, consumed in this order:
//!
//! 1. [`WorkflowService`] validates a requested status transition against
//!    the current status and the acting user's role, commits the status
//!    write, and hands the resulting [`TransitionDescriptor`] to the
//!    fan-out engine.
//! 2. [`NotificationEngine`] derives zero or more notification records
//!    from a transition (or a direct event), persists each one
//!    independently and best-effort, and later resolves the visible
//!    subset for a viewing user under the store's constrained query
//!    model.
//!
//! The status write is the operation of record. Notification delivery
//! failures are logged and swallowed at the engine boundary and can
//! never roll back or block a committed transition.

pub mod fanout;
pub mod inbox;
pub mod workflow;

pub use fanout::{FanoutOutcome, NotificationEngine};
pub use workflow::{TransitionError, WorkflowService};

pub use vestry_core::{
    classify_transition, is_legal_transition, Actor, ChurchStatus, Diocese,
    HeritageClassification, NotificationType, Priority, Recipients, StaffRole, TemplateSet,
    TransitionDescriptor, TransitionKind, ViewingUser,
};
pub use vestry_storage::{
    ChurchRecord, ChurchStore, NotificationRecord, NotificationStore, RelatedData, StorageError,
};
