//! Data Models
//!
//! - [`keys`] - Structural key conventions and fixed path/meta names
//! - [`node`] - Typed access to model nodes, deep copy, item payloads

pub mod keys;
pub mod node;

pub use keys::{MetaProperty, StructuralKeys, CONTENT_DELIMITER};
pub use node::{deep_copy, is_empty_model, ItemData, ModelNodeExt};
