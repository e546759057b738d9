//! vestry-core: pure domain layer for the church approval workflow.
//!
//! Everything in this crate is a pure function or a plain value type.
//! No async, no I/O, no store handle. The engine crate composes these
//! over a document store; this crate can be unit-tested in isolation.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`classify_transition()`] -- name the semantic kind of a status change
//! - [`is_legal_transition()`] -- the role-gated move table
//! - [`TransitionDescriptor`] -- ephemeral record of an applied transition
//! - [`Recipients`] -- the closed recipient-rule language
//! - [`routes_for()`] -- static transition-kind to notification routing table
//! - [`TemplateSet`] -- per-type title/message templates with `{placeholder}`
//!   interpolation

pub mod action_url;
pub mod notification;
pub mod status;
pub mod template;
pub mod transition;

pub use action_url::action_url;
pub use notification::{
    routes_for, NotificationType, Priority, Recipients, Route, ViewingUser,
};
pub use status::{ChurchStatus, Diocese, HeritageClassification, StaffRole};
pub use template::{interpolate, Template, TemplateSet};
pub use transition::{
    classify_transition, is_legal_transition, Actor, TransitionDescriptor, TransitionKind,
};
