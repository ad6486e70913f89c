//! Structural Keys
//!
//! A model document mixes ordinary component properties with a fixed set of
//! structural markers (type, path, child items, item order, child pages,
//! hierarchy type). Servers emit these markers under one of two naming
//! conventions:
//!
//! - **Namespaced**: `:type`, `:items`, `:itemsOrder`, `:path`, `:children`, `:hierarchyType`
//! - **Short**: `cqType`, `cqItems`, `cqItemsOrder`, `cqPath`, `cqChildren`, `cqHierarchyType`
//!
//! The convention in use is a configuration value, never hardcoded at the
//! call sites.

use serde::{Deserialize, Serialize};

/// Path segment separating a page path from the item path inside that page
pub const CONTENT_DELIMITER: &str = "jcr:content";

/// Names of the host meta properties consulted by the manager and router
pub struct MetaProperty;

impl MetaProperty {
    /// Meta property pointing to the page model root
    pub const PAGE_MODEL_ROOT_URL: &'static str = "cq:pagemodel_root_url";

    /// Meta property holding comma-separated route exclusion patterns
    pub const PAGE_MODEL_ROUTE_FILTERS: &'static str = "cq:pagemodel_route_filters";

    /// Meta property enabling or disabling the model router
    pub const PAGE_MODEL_ROUTER: &'static str = "cq:pagemodel_router";
}

/// Naming convention for the structural markers of a model node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralKeys {
    /// Component type of the node
    pub type_key: String,

    /// Absolute path of the node (mostly present on pages)
    pub path_key: String,

    /// Map of item name → child item node
    pub items_key: String,

    /// Authoritative iteration order of `items`
    pub items_order_key: String,

    /// Map of absolute page path → child page node
    pub children_key: String,

    /// Marks a node as a page container
    pub hierarchy_type_key: String,
}

impl StructuralKeys {
    /// The `:items` convention
    pub fn namespaced() -> Self {
        Self {
            type_key: ":type".to_string(),
            path_key: ":path".to_string(),
            items_key: ":items".to_string(),
            items_order_key: ":itemsOrder".to_string(),
            children_key: ":children".to_string(),
            hierarchy_type_key: ":hierarchyType".to_string(),
        }
    }

    /// The `cqItems` convention
    pub fn short() -> Self {
        Self {
            type_key: "cqType".to_string(),
            path_key: "cqPath".to_string(),
            items_key: "cqItems".to_string(),
            items_order_key: "cqItemsOrder".to_string(),
            children_key: "cqChildren".to_string(),
            hierarchy_type_key: "cqHierarchyType".to_string(),
        }
    }

    /// All keys in declaration order
    pub fn all(&self) -> [&str; 6] {
        [
            self.type_key.as_str(),
            self.path_key.as_str(),
            self.items_key.as_str(),
            self.items_order_key.as_str(),
            self.children_key.as_str(),
            self.hierarchy_type_key.as_str(),
        ]
    }

    /// Validate that every key is non-empty and unique
    pub fn validate(&self) -> Result<(), String> {
        let keys = self.all();

        for (index, key) in keys.iter().enumerate() {
            if key.is_empty() {
                return Err("structural keys cannot be empty".to_string());
            }

            if keys[index + 1..].contains(key) {
                return Err(format!("structural key '{}' is used more than once", key));
            }
        }

        Ok(())
    }
}

impl Default for StructuralKeys {
    fn default() -> Self {
        Self::namespaced()
    }
}
