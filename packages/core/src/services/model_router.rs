//! Model Router
//!
//! Turns route changes into model requests. A routed path is loaded through
//! the [`ModelManager`] (which caches), and the result is broadcast as
//! [`ModelEvent::RouteChanged`].
//!
//! Two meta properties control routing:
//!
//! - `cq:pagemodel_router` - routing is on unless this is `"false"`
//! - `cq:pagemodel_route_filters` - comma-separated regular expressions;
//!   a route matching any of them is not loaded

use crate::db::ModelEvent;
use crate::models::MetaProperty;
use crate::services::{ModelManager, ModelManagerError};
use crate::utils::url::sanitize;
use regex::Regex;
use serde_json::Value;

/// Result of a routing attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Routing is switched off by meta property
    Disabled,

    /// Empty or root route; nothing to load
    Skipped,

    /// The route matched a route filter
    Excluded,

    /// The model was resolved and broadcast
    Routed { path: String, model: Value },
}

/// Loads models for route changes
#[derive(Debug, Clone)]
pub struct ModelRouter {
    manager: ModelManager,
}

impl ModelRouter {
    pub fn new(manager: ModelManager) -> Self {
        Self { manager }
    }

    /// Whether routing is enabled for the host page
    pub fn is_enabled(&self) -> bool {
        self.manager
            .host()
            .meta_property(MetaProperty::PAGE_MODEL_ROUTER)
            .map_or(true, |value| value != "false")
    }

    /// Whether `route` matches one of the configured route filters
    ///
    /// Filters that are not valid regular expressions are logged and skipped.
    pub fn is_route_excluded(&self, route: &str) -> bool {
        let Some(filters) = self
            .manager
            .host()
            .meta_property(MetaProperty::PAGE_MODEL_ROUTE_FILTERS)
        else {
            return false;
        };

        filters
            .split(',')
            .filter(|filter| !filter.is_empty())
            .any(|filter| match Regex::new(filter) {
                Ok(regex) => regex.is_match(route),
                Err(e) => {
                    tracing::warn!("Ignoring invalid route filter '{}': {}", filter, e);
                    false
                }
            })
    }

    /// Load the model for `route` and broadcast it
    pub async fn route(&self, route: &str) -> Result<RouteOutcome, ModelManagerError> {
        if !self.is_enabled() {
            return Ok(RouteOutcome::Disabled);
        }

        if route.is_empty() || route == "/" {
            return Ok(RouteOutcome::Skipped);
        }

        if self.is_route_excluded(route) {
            tracing::debug!("Route {} is excluded", route);
            return Ok(RouteOutcome::Excluded);
        }

        let model = self.manager.get_data(route).await?;
        self.manager.emit_event(ModelEvent::RouteChanged {
            path: route.to_string(),
            model: model.clone(),
        });

        Ok(RouteOutcome::Routed {
            path: route.to_string(),
            model,
        })
    }

    /// Route to the host's current location
    pub async fn route_current(&self) -> Result<RouteOutcome, ModelManagerError> {
        let host = self.manager.host();
        let route = host
            .current_pathname()
            .and_then(|pathname| sanitize(&pathname, &host.context_path()))
            .unwrap_or_default();

        self.route(&route).await
    }
}
