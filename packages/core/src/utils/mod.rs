//! Utility functions for pagemodel-core
//!
//! - [`path`] - Path algebra over page and item paths
//! - [`url`] - Model request URL rewriting

pub mod path;
pub mod url;

pub use path::{is_item, split_page_content_paths, PageContentPaths};
