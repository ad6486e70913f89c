//! Listener Registry
//!
//! Maps a normalized path to the callbacks registered for it. Callbacks for
//! one path run in registration order; an error or panic in one of them is
//! logged and the remaining callbacks still run.
//!
//! The registry never holds its lock while a callback runs, so callbacks may
//! add or remove listeners themselves.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

/// Change callback, invoked with the notified path
pub type ModelListener = Arc<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;

/// Path-keyed, ordered listener lists
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<HashMap<String, Vec<ModelListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` to the list for `path`
    pub fn add(&self, path: &str, listener: ModelListener) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
        listeners.entry(path.to_string()).or_default().push(listener);
    }

    /// Remove the first registration of `listener` for `path`
    ///
    /// Listeners are compared by identity. Returns whether one was removed.
    pub fn remove(&self, path: &str, listener: &ModelListener) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|p| p.into_inner());

        let Some(registered) = listeners.get_mut(path) else {
            return false;
        };
        let Some(index) = registered.iter().position(|l| Arc::ptr_eq(l, listener)) else {
            return false;
        };

        registered.remove(index);
        if registered.is_empty() {
            listeners.remove(path);
        }
        true
    }

    /// Number of listeners registered for `path`
    pub fn count(&self, path: &str) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(path)
            .map_or(0, Vec::len)
    }

    /// Invoke every listener registered for `path`
    ///
    /// Returns how many listeners completed without error.
    pub fn notify(&self, path: &str) -> usize {
        let snapshot = self
            .listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(path)
            .cloned()
            .unwrap_or_default();

        let mut succeeded = 0;
        for listener in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(path))) {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(e)) => {
                    tracing::error!("Listener for '{}' failed: {}", path, e);
                }
                Err(_) => {
                    tracing::error!("Listener for '{}' panicked", path);
                }
            }
        }

        succeeded
    }

    /// Drop every registration
    pub fn clear(&self) {
        self.listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.lock().unwrap_or_else(|p| p.into_inner());
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(path, list)| (path.as_str(), list.len()))
            .collect();

        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}
