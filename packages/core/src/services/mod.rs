//! Model Services
//!
//! This module contains the services built on top of the content store:
//!
//! - `ModelManager` - Fetch-or-serve coordination, fetch deduplication, listeners
//! - `ListenerRegistry` - Path-keyed change callbacks
//! - `ModelClient` - Fetch adapter contract (`HttpModelClient`, `InMemoryModelClient`)
//! - `HostEnvironment` - Meta properties and current location of the host page
//! - `EditorClient` - Applies in-page editor update messages
//! - `ModelRouter` - Loads models for route changes
//!
//! Services coordinate between the store and the embedding page; the store
//! itself knows nothing about fetching or notification.

pub mod editor_client;
pub mod error;
pub mod host;
pub mod listener_registry;
pub mod model_client;
pub mod model_manager;
pub mod model_router;

pub use editor_client::{
    EditorClient, EditorClientHandle, EditorCommand, EditorMessage, UpdateOutcome,
};
pub use error::{FetchError, ModelManagerError};
pub use host::{HostEnvironment, StaticHost};
pub use listener_registry::{ListenerRegistry, ModelListener};
pub use model_client::{HttpModelClient, InMemoryModelClient, ModelClient};
pub use model_manager::{GetDataOptions, InitOptions, ModelManager};
pub use model_router::{ModelRouter, RouteOutcome};
