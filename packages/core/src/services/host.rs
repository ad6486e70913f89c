//! Host Environment
//!
//! The page the model is rendered into supplies two things: meta properties
//! (`cq:pagemodel_root_url` and friends) and the current location. The
//! manager and router read both through [`HostEnvironment`] instead of
//! reaching for globals.

use crate::utils::url::{context_path_of, internalize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Read access to the embedding page
pub trait HostEnvironment: Send + Sync {
    /// Value of the meta property `name`, if the page declares it
    fn meta_property(&self, name: &str) -> Option<String>;

    /// Path component of the current location (`/ctx/content/site/page.html`)
    fn current_pathname(&self) -> Option<String>;

    /// Context path derived from the current location
    fn context_path(&self) -> String {
        self.current_pathname()
            .map(|pathname| context_path_of(&pathname))
            .unwrap_or_default()
    }

    /// Meta property read as a path, with the context path removed
    fn meta_path(&self, name: &str) -> Option<String> {
        let value = self.meta_property(name)?;
        Some(internalize(&value, &self.context_path()))
    }
}

/// Host with fixed meta properties and a settable location
#[derive(Debug, Default)]
pub struct StaticHost {
    meta: HashMap<String, String>,
    pathname: RwLock<Option<String>>,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a meta property
    pub fn with_meta(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(name.into(), value.into());
        self
    }

    /// Set the initial location
    pub fn with_pathname(self, pathname: impl Into<String>) -> Self {
        self.navigate(pathname);
        self
    }

    /// Change the current location
    pub fn navigate(&self, pathname: impl Into<String>) {
        *self.pathname.write().unwrap_or_else(|p| p.into_inner()) = Some(pathname.into());
    }
}

impl HostEnvironment for StaticHost {
    fn meta_property(&self, name: &str) -> Option<String> {
        self.meta.get(name).cloned()
    }

    fn current_pathname(&self) -> Option<String> {
        self.pathname
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}
