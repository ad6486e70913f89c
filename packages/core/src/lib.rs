//! Page Model Core
//!
//! Keeps a client-side page model (a JSON tree of page components) in sync
//! with a content server and with in-page editor updates.
//!
//! # Architecture
//!
//! - **Path-addressed tree**: pages are addressed by absolute path, components
//!   inside a page by an item path after the `jcr:content` delimiter
//! - **Copy-on-read store**: reads hand out deep copies; mutation goes through
//!   explicit store operations
//! - **Deduplicated fetching**: concurrent requests for one model share a
//!   single fetch
//! - **Explicit instances**: no global state; every manager owns its store,
//!   listeners and pending fetches
//!
//! # Modules
//!
//! - [`models`] - Structural key conventions and model node access
//! - [`utils`] - Path algebra and model URL rewriting
//! - [`db`] - Content store and model events
//! - [`services`] - Model manager, fetch adapters, listeners, editor bridge, router
//! - [`config`] - Manager configuration

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{ConfigError, ManagerConfig};
pub use db::{ModelEvent, ModelStore, StoreError};
pub use models::*;
pub use services::*;
