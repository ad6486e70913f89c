//! Model Manager
//!
//! Coordinates the content store, the fetch adapter and the listener
//! registry. Callers ask for the model at a path; the manager serves it from
//! the store or fetches it, stores it, and notifies listeners.
//!
//! # Architecture
//!
//! ```text
//! get_data(path) ──► store hit? ──yes──► deep copy
//!                        │ no
//!                        ▼
//!                 pending fetch for url? ──yes──► await the same future
//!                        │ no
//!                        ▼
//!                 client.fetch(url) ──► store.insert ──► notify(path) [+ notify("")]
//! ```
//!
//! Concurrent requests for the same model URL share one `Shared` future, so
//! the adapter sees exactly one call. The pending entry is removed once the
//! fetch settles, whatever the outcome; the next request fetches again.
//!
//! # Instances
//!
//! There is no global state. Each `ModelManager` owns its store, listeners and
//! pending fetches; clones share them.

use crate::config::ManagerConfig;
use crate::db::{ModelEvent, ModelStore};
use crate::models::{deep_copy, is_empty_model, MetaProperty};
use crate::services::{
    HostEnvironment, ListenerRegistry, ModelClient, ModelListener, ModelManagerError,
};
use crate::utils::path::{is_item, strip_content_suffix};
use crate::utils::url::{internalize, sanitize, to_model_url};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock as StdRwLock};
use tokio::sync::{broadcast, Mutex as AsyncMutex, RwLock};

type SharedFetch = Shared<BoxFuture<'static, Result<Value, ModelManagerError>>>;

/// One in-flight fetch, tagged so that only its own waiters clear it
struct PendingFetch {
    id: u64,
    future: SharedFetch,
}

/// Options for [`ModelManager::initialize`]
///
/// A bare path converts into options with only `path` set.
#[derive(Clone, Default)]
pub struct InitOptions {
    /// Root path of the model; falls back to the root meta property, then the
    /// current location
    pub path: Option<String>,

    /// Already known model tree; skips every fetch
    pub model: Option<Value>,

    /// Prepared store installed in place of the empty one; when it already
    /// holds the root model, nothing is fetched
    pub store: Option<ModelStore>,

    /// Replacement fetch adapter for this and later requests
    pub client: Option<Arc<dyn ModelClient>>,
}

impl InitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_model(mut self, model: Value) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_store(mut self, store: ModelStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.client = Some(client);
        self
    }
}

impl From<&str> for InitOptions {
    fn from(path: &str) -> Self {
        Self::new().with_path(path)
    }
}

impl From<String> for InitOptions {
    fn from(path: String) -> Self {
        Self::new().with_path(path)
    }
}

/// Options for [`ModelManager::get_data`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetDataOptions {
    /// Path of the requested model; `None` means the root
    pub path: Option<String>,

    /// Fetch even if the store already holds the model
    pub force_reload: bool,
}

impl GetDataOptions {
    /// Options that always fetch `path`
    pub fn reload(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            force_reload: true,
        }
    }
}

impl From<&str> for GetDataOptions {
    fn from(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            force_reload: false,
        }
    }
}

impl From<String> for GetDataOptions {
    fn from(path: String) -> Self {
        Self {
            path: Some(path),
            force_reload: false,
        }
    }
}

struct ManagerInner {
    config: ManagerConfig,
    host: Arc<dyn HostEnvironment>,
    client: StdRwLock<Arc<dyn ModelClient>>,
    store: RwLock<ModelStore>,
    listeners: ListenerRegistry,
    pending: Mutex<HashMap<String, PendingFetch>>,
    next_fetch_id: AtomicU64,
    initialization: AsyncMutex<()>,
    events: broadcast::Sender<ModelEvent>,
}

/// Page model coordinator
#[derive(Clone)]
pub struct ModelManager {
    inner: Arc<ManagerInner>,
}

impl ModelManager {
    /// Create a manager
    ///
    /// Fails if `config` does not validate.
    pub fn new(
        config: ManagerConfig,
        client: Arc<dyn ModelClient>,
        host: Arc<dyn HostEnvironment>,
    ) -> Result<Self, ModelManagerError> {
        config.validate().map_err(ModelManagerError::InvalidConfig)?;

        let (events, _) = broadcast::channel(config.event_capacity);
        let store = ModelStore::with_keys(config.keys.clone(), None, None);

        Ok(Self {
            inner: Arc::new(ManagerInner {
                config,
                host,
                client: StdRwLock::new(client),
                store: RwLock::new(store),
                listeners: ListenerRegistry::new(),
                pending: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(0),
                initialization: AsyncMutex::new(()),
                events,
            }),
        })
    }

    /// Configuration the manager was built with
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Host environment the manager reads meta properties and location from
    pub fn host(&self) -> &Arc<dyn HostEnvironment> {
        &self.inner.host
    }

    /// Subscribe to model events
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<ModelEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) fn emit_event(&self, event: ModelEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Root path of the loaded model
    pub async fn root_path(&self) -> Option<String> {
        self.inner.store.read().await.root_path().map(str::to_string)
    }

    /// Load the root model
    ///
    /// Tears down any previous state (tree, listeners, pending fetches) first,
    /// then installs the supplied store if there is one. The root path is the
    /// explicit path, else the `cq:pagemodel_root_url` meta property, else the
    /// current location. A supplied model, or a supplied store that already
    /// holds the root, is used without fetching; an empty supplied model is
    /// rejected. When the current location is a different page that the
    /// fetched root model does not contain, that page is fetched as well and
    /// added as a child; a failure there is logged and the root model is still
    /// returned.
    pub async fn initialize(
        &self,
        options: impl Into<InitOptions>,
    ) -> Result<Value, ModelManagerError> {
        let _initializing = self.inner.initialization.lock().await;
        let options = options.into();

        if options.model.as_ref().is_some_and(is_empty_model) {
            return Err(ModelManagerError::InvalidConfig(
                "supplied model is empty".to_string(),
            ));
        }

        self.destroy().await;
        if let Some(client) = options.client {
            *self.inner.client.write().unwrap_or_else(|p| p.into_inner()) = client;
        }
        if let Some(store) = options.store {
            *self.inner.store.write().await = store;
        }

        let host = &self.inner.host;
        let context_path = host.context_path();
        let meta_root = host
            .meta_property(MetaProperty::PAGE_MODEL_ROOT_URL)
            .map(|url| internalize(&url, &context_path))
            .filter(|url| !url.is_empty());
        let current_path = host
            .current_pathname()
            .and_then(|pathname| sanitize(&pathname, &context_path));

        let root_url = options
            .path
            .filter(|path| !path.is_empty())
            .or(meta_root)
            .or_else(|| current_path.clone())
            .ok_or_else(|| {
                ModelManagerError::invalid_path("no root path, root meta property or location")
            })?;
        let root_path = sanitize(&root_url, &context_path).unwrap_or_else(|| root_url.clone());

        tracing::debug!("Initializing model manager at {}", root_path);
        self.emit_event(ModelEvent::Initialized {
            root_path: root_path.clone(),
        });

        if let Some(model) = options.model {
            self.inner
                .store
                .write()
                .await
                .initialize(Some(&root_path), Some(model));
            return self.finish_initialization(&root_path).await;
        }

        {
            let mut store = self.inner.store.write().await;
            if store.get_data_ref(Some(&root_path)).is_some() {
                tracing::debug!("Root model {} already in the store", root_path);
                store.initialize(Some(&root_path), None);
                drop(store);
                return self.finish_initialization(&root_path).await;
            }
        }

        let root_model = self.client().fetch(&self.model_url(&root_url)).await?;
        let contains_current = current_path.as_deref().is_some_and(|current| {
            root_model
                .get(&self.inner.config.keys.children_key)
                .and_then(|children| children.get(current))
                .is_some()
        });
        self.inner
            .store
            .write()
            .await
            .initialize(Some(&root_path), Some(root_model));

        if let Some(current) = current_path.filter(|current| *current != root_path) {
            if !contains_current {
                self.load_current_page(&current).await;
            }
        }

        self.finish_initialization(&root_path).await
    }

    async fn load_current_page(&self, current: &str) {
        tracing::debug!("Fetching current page {} missing from the root model", current);

        match self.client().fetch(&self.model_url(current)).await {
            Ok(model) => {
                if let Err(e) = self
                    .inner
                    .store
                    .write()
                    .await
                    .insert_data(current, &model, None, false)
                {
                    tracing::warn!("Failed to store current page {}: {}", current, e);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch current page {}: {}", current, e);
            }
        }
    }

    async fn finish_initialization(&self, root_path: &str) -> Result<Value, ModelManagerError> {
        let model = self
            .inner
            .store
            .read()
            .await
            .get_data(None)
            .ok_or_else(|| ModelManagerError::not_found(root_path))?;

        self.emit_event(ModelEvent::Loaded {
            model: deep_copy(&model),
        });
        Ok(model)
    }

    /// Model at a path, from the store or fetched
    ///
    /// Waits for a running `initialize` to finish. With `force_reload` the
    /// model is always fetched. The result is a copy; changing it never
    /// affects the store.
    pub async fn get_data(
        &self,
        options: impl Into<GetDataOptions>,
    ) -> Result<Value, ModelManagerError> {
        let options = options.into();
        drop(self.inner.initialization.lock().await);

        let path = options.path.filter(|path| !path.is_empty());

        if !options.force_reload {
            if let Some(data) = self.inner.store.read().await.get_data(path.as_deref()) {
                return Ok(data);
            }
        }

        let path = match path {
            Some(path) => path,
            None => self.root_path().await.ok_or_else(|| {
                ModelManagerError::invalid_path("no path requested and no root model loaded")
            })?,
        };

        self.fetch_data(&path).await
    }

    /// Fetch `path`, joining an identical in-flight fetch if there is one
    async fn fetch_data(&self, path: &str) -> Result<Value, ModelManagerError> {
        let url = self.model_url(path);

        let (id, future) = {
            let mut pending = self.inner.pending.lock().unwrap_or_else(|p| p.into_inner());

            match pending.get(&url) {
                Some(entry) => {
                    tracing::debug!("Joining pending fetch for {}", url);
                    (entry.id, entry.future.clone())
                }
                None => {
                    let id = self.inner.next_fetch_id.fetch_add(1, Ordering::SeqCst);
                    let future = self
                        .clone()
                        .load(path.to_string(), url.clone())
                        .boxed()
                        .shared();

                    pending.insert(
                        url.clone(),
                        PendingFetch {
                            id,
                            future: future.clone(),
                        },
                    );
                    (id, future)
                }
            }
        };

        let result = future.await;

        let mut pending = self.inner.pending.lock().unwrap_or_else(|p| p.into_inner());
        if pending.get(&url).is_some_and(|entry| entry.id == id) {
            pending.remove(&url);
        }

        result
    }

    async fn load(self, path: String, url: String) -> Result<Value, ModelManagerError> {
        let model = self.client().fetch(&url).await?;

        {
            let mut store = self.inner.store.write().await;
            let is_root = !store.is_initialized()
                || store.root_path() == Some(strip_content_suffix(&path));

            if is_root {
                let root_path = store.root_path().unwrap_or(&path).to_string();
                store.initialize(Some(&root_path), Some(deep_copy(&model)));
            } else {
                store.insert_data(&path, &model, None, false)?;
            }
        }

        self.notify_listeners(&path).await;
        if !is_item(&path) {
            self.notify_listeners("").await;
        }

        Ok(model)
    }

    /// Number of fetches currently in flight
    pub fn pending_fetch_count(&self) -> usize {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .len()
    }

    /// Listen for changes at `path`; the root path and `""` share one list
    pub async fn add_listener(&self, path: &str, listener: ModelListener) {
        let path = self.adapt_path(path).await;
        self.inner.listeners.add(&path, listener);
    }

    /// Stop `listener` from receiving changes at `path`
    ///
    /// Removing a listener that was never added does nothing.
    pub async fn remove_listener(&self, path: &str, listener: &ModelListener) {
        let path = self.adapt_path(path).await;
        self.inner.listeners.remove(&path, listener);
    }

    /// Run the listeners registered for `path`
    pub async fn notify_listeners(&self, path: &str) {
        let path = self.adapt_path(path).await;
        let notified = self.inner.listeners.notify(&path);
        tracing::debug!("Notified {} listener(s) for '{}'", notified, path);
    }

    /// Apply `f` to the store under its write lock
    pub async fn update_store<R>(&self, f: impl FnOnce(&mut ModelStore) -> R) -> R {
        f(&mut *self.inner.store.write().await)
    }

    /// Apply `f` to the store under its read lock
    pub async fn read_store<R>(&self, f: impl FnOnce(&ModelStore) -> R) -> R {
        f(&*self.inner.store.read().await)
    }

    /// Drop the model tree, listeners and pending fetches
    pub async fn destroy(&self) {
        self.inner.store.write().await.destroy();
        self.inner.listeners.clear();
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
    }

    /// Request URL of the model at `path`
    pub fn model_url(&self, path: &str) -> String {
        let config = &self.inner.config;
        to_model_url(
            path,
            &config.model_selector,
            &config.model_extension,
            &self.inner.host.context_path(),
        )
    }

    fn client(&self) -> Arc<dyn ModelClient> {
        Arc::clone(&self.inner.client.read().unwrap_or_else(|p| p.into_inner()))
    }

    /// Listener key of `path`: `""` for the root page, else the internal path
    async fn adapt_path(&self, path: &str) -> String {
        if path.is_empty() {
            return String::new();
        }

        let Some(root_path) = self.root_path().await else {
            return path.to_string();
        };

        let context_path = self.inner.host.context_path();
        let local_path = internalize(path, &context_path);
        let local_root = sanitize(&root_path, &context_path).unwrap_or_default();

        if local_path == local_root {
            String::new()
        } else {
            local_path
        }
    }
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("config", &self.inner.config)
            .field("listeners", &self.inner.listeners)
            .field("pending_fetches", &self.pending_fetch_count())
            .finish()
    }
}
