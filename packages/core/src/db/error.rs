//! Store Error Types
//!
//! Errors returned by [`ModelStore`](crate::db::ModelStore) mutations. Lookups
//! return `Option` instead; a missing node on read is not an error.

use thiserror::Error;

/// Content store operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Mutation called without a target path
    #[error("No path provided for {operation}")]
    MissingPath { operation: &'static str },

    /// Path cannot address an item (no node name)
    #[error("Invalid model path: {0}")]
    InvalidPath(String),

    /// Item traversal attempted before any tree was loaded
    #[error("Model store has no data; initialize it before addressing items")]
    Uninitialized,

    /// No page node at the given page path
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// No item node at the given path
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// An intermediate item on the path does not exist
    #[error("Parent of {0} not found")]
    ParentNotFound(String),

    /// The parent node has no items map to write into
    #[error("Parent of {0} has no items map")]
    MissingItemsMap(String),
}

impl StoreError {
    /// Create a missing path error
    pub fn missing_path(operation: &'static str) -> Self {
        Self::MissingPath { operation }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a page not found error
    pub fn page_not_found(path: impl Into<String>) -> Self {
        Self::PageNotFound(path.into())
    }

    /// Create an item not found error
    pub fn item_not_found(path: impl Into<String>) -> Self {
        Self::ItemNotFound(path.into())
    }

    /// Create a parent not found error
    pub fn parent_not_found(path: impl Into<String>) -> Self {
        Self::ParentNotFound(path.into())
    }

    /// Create a missing items map error
    pub fn missing_items_map(path: impl Into<String>) -> Self {
        Self::MissingItemsMap(path.into())
    }
}
