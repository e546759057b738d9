//! vestry-storage: document-store abstraction for the church registry.
//!
//! The hosted document store behind the platform can filter a query on
//! one equality predicate or one array-membership predicate, with
//! ordering and a limit, and nothing more. The traits here encode that
//! constraint in their surface: there is no method that combines two
//! membership predicates, so callers are forced into the two-pass
//! query-then-filter read path the engine crate implements.

mod error;
mod record;
mod traits;

pub mod conformance;
pub mod memory;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use record::{ChurchRecord, NotificationRecord, RelatedData};
pub use traits::{ChurchStore, NotificationStore, MAX_BATCH_MUTATIONS};
