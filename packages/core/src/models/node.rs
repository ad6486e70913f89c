//! Model Node
//!
//! A model node is a JSON object whose keys are either ordinary component
//! properties or one of the structural markers named by [`StructuralKeys`].
//! Nodes are kept as plain `serde_json::Value`s so that arbitrary component
//! properties survive untouched; [`ModelNodeExt`] gives typed access to the
//! structural parts.
//!
//! Model trees are acyclic by construction (they are parsed from JSON), so the
//! copy helpers here never guard against cycles.

use crate::models::StructuralKeys;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Typed access to the structural markers of a model node
pub trait ModelNodeExt {
    /// Child items map
    fn items(&self, keys: &StructuralKeys) -> Option<&Map<String, Value>>;

    /// Mutable child items map
    fn items_mut(&mut self, keys: &StructuralKeys) -> Option<&mut Map<String, Value>>;

    /// Item order list
    fn items_order(&self, keys: &StructuralKeys) -> Option<&Vec<Value>>;

    /// Mutable item order list
    fn items_order_mut(&mut self, keys: &StructuralKeys) -> Option<&mut Vec<Value>>;

    /// Child pages map
    fn children(&self, keys: &StructuralKeys) -> Option<&Map<String, Value>>;

    /// Mutable child pages map
    fn children_mut(&mut self, keys: &StructuralKeys) -> Option<&mut Map<String, Value>>;

    /// Absolute path of the node, when present
    fn node_path(&self, keys: &StructuralKeys) -> Option<&str>;

    /// Component type of the node, when present
    fn node_type(&self, keys: &StructuralKeys) -> Option<&str>;

    /// Whether the node declares a hierarchy type (i.e. is a page container)
    fn is_page(&self, keys: &StructuralKeys) -> bool;
}

impl ModelNodeExt for Value {
    fn items(&self, keys: &StructuralKeys) -> Option<&Map<String, Value>> {
        self.get(&keys.items_key)?.as_object()
    }

    fn items_mut(&mut self, keys: &StructuralKeys) -> Option<&mut Map<String, Value>> {
        self.get_mut(&keys.items_key)?.as_object_mut()
    }

    fn items_order(&self, keys: &StructuralKeys) -> Option<&Vec<Value>> {
        self.get(&keys.items_order_key)?.as_array()
    }

    fn items_order_mut(&mut self, keys: &StructuralKeys) -> Option<&mut Vec<Value>> {
        self.get_mut(&keys.items_order_key)?.as_array_mut()
    }

    fn children(&self, keys: &StructuralKeys) -> Option<&Map<String, Value>> {
        self.get(&keys.children_key)?.as_object()
    }

    fn children_mut(&mut self, keys: &StructuralKeys) -> Option<&mut Map<String, Value>> {
        self.get_mut(&keys.children_key)?.as_object_mut()
    }

    fn node_path(&self, keys: &StructuralKeys) -> Option<&str> {
        self.get(&keys.path_key)?.as_str()
    }

    fn node_type(&self, keys: &StructuralKeys) -> Option<&str> {
        self.get(&keys.type_key)?.as_str()
    }

    fn is_page(&self, keys: &StructuralKeys) -> bool {
        self.get(&keys.hierarchy_type_key)
            .and_then(Value::as_str)
            .is_some_and(|hierarchy| hierarchy == "page")
    }
}

/// Structural deep copy of a model value
///
/// Walks only the shapes a model can contain (mapping, sequence, scalar).
/// The result shares nothing with `value`.
pub fn deep_copy(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), deep_copy(child)))
                .collect(),
        ),
        Value::Array(values) => Value::Array(values.iter().map(deep_copy).collect()),
        Value::String(s) => Value::String(s.clone()),
        Value::Number(n) => Value::Number(n.clone()),
        Value::Bool(b) => Value::Bool(*b),
        Value::Null => Value::Null,
    }
}

/// Whether a value carries no model data (null or an empty object)
pub fn is_empty_model(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Named item payload used by replace and insert operations
///
/// `key` names the item for inserts; replaces take the name from the target
/// path and ignore it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

impl ItemData {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}
