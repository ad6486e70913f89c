//! Content Store Layer
//!
//! This module owns the in-memory page model:
//!
//! - [`ModelStore`] - the model tree with path-based reads and mutations
//! - [`StoreError`] - mutation failures
//! - [`ModelEvent`] - global notifications published by the services
//!
//! # Architecture
//!
//! The store is a plain synchronous value. Every operation completes without
//! suspending, so a caller holding the store (directly, or through the
//! manager's lock) observes each mutation as atomic.

mod error;
pub mod events;
pub mod model_store;

pub use error::StoreError;
pub use events::ModelEvent;
pub use model_store::ModelStore;
