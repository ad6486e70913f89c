//! Model Events
//!
//! Global, fire-and-forget notifications about the page model. The manager
//! publishes them on a `tokio::sync::broadcast` channel; any number of UI
//! layers may subscribe without the store knowing about them.
//!
//! # Event Flow
//!
//! 1. `ModelManager::initialize` emits [`ModelEvent::Initialized`], then
//!    [`ModelEvent::Loaded`] with the fetched tree
//! 2. The editor bridge emits [`ModelEvent::Loaded`] after every applied update
//! 3. The router emits [`ModelEvent::RouteChanged`] with the routed model
//!
//! Subscribers that lag behind lose the oldest events (broadcast semantics).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Notifications emitted by the model manager and its collaborators
///
/// `Loaded` and `RouteChanged` always carry deep copies; holding on to one
/// never pins or exposes store state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModelEvent {
    /// The manager was initialized against a root path
    #[serde(rename = "cq-pagemodel-init")]
    Initialized { root_path: String },

    /// The whole model tree was (re)loaded
    #[serde(rename = "cq-pagemodel-loaded")]
    Loaded { model: Value },

    /// The model for a routed path was resolved
    #[serde(rename = "cq-pagemodel-route-changed")]
    RouteChanged { path: String, model: Value },
}

impl ModelEvent {
    /// Host event name of this notification
    pub fn event_type(&self) -> &str {
        match self {
            ModelEvent::Initialized { .. } => "cq-pagemodel-init",
            ModelEvent::Loaded { .. } => "cq-pagemodel-loaded",
            ModelEvent::RouteChanged { .. } => "cq-pagemodel-route-changed",
        }
    }
}
