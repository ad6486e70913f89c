//! Editor Bridge
//!
//! Applies update messages sent by an in-page editor to the model:
//!
//! ```json
//! { "cmd": "insertAfter", "path": "/content/site/jcr:content/root/text",
//!   "data": { "key": "image", "value": { ":type": "image" } } }
//! ```
//!
//! Each supported command is one store call, followed by a listener
//! notification for the affected path and a [`ModelEvent::Loaded`] broadcast
//! carrying a copy of the whole tree. Unsupported commands change nothing but
//! are still followed by the broadcast; malformed messages are dropped.
//!
//! For inserts the message path names the *sibling*; the new item's name is
//! `data.key` and it goes into the sibling's parent.
//!
//! `moveBefore`, `moveAfter` and `replaceContent` are not handled here. The
//! editor follows a move with `replace` messages for both parents, which carry
//! the relocated item; those are applied normally.

use crate::db::{ModelEvent, StoreError};
use crate::models::ItemData;
use crate::services::ModelManager;
use crate::utils::path::{node_name, parent_node_path};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Raw editor message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorMessage {
    #[serde(default)]
    pub cmd: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub data: Option<ItemData>,
}

/// Commands understood by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Replace,
    Delete,
    InsertBefore,
    InsertAfter,
}

impl EditorCommand {
    /// Parse a wire command name; `None` for anything unsupported
    pub fn parse(cmd: &str) -> Option<Self> {
        match cmd {
            "replace" => Some(Self::Replace),
            "delete" => Some(Self::Delete),
            "insertBefore" => Some(Self::InsertBefore),
            "insertAfter" => Some(Self::InsertAfter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Delete => "delete",
            Self::InsertBefore => "insertBefore",
            Self::InsertAfter => "insertAfter",
        }
    }
}

/// What became of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The store was updated
    Applied { notified_path: Option<String> },

    /// The command ran but the store rejected it; listeners were still notified
    Failed {
        notified_path: Option<String>,
        error: StoreError,
    },

    /// The command is not handled by this bridge
    Unsupported { cmd: String },

    /// Missing `cmd`, `path` or required `data`
    Malformed,
}

/// Applies editor messages through a [`ModelManager`]
#[derive(Debug, Clone)]
pub struct EditorClient {
    manager: ModelManager,
}

impl EditorClient {
    pub fn new(manager: ModelManager) -> Self {
        Self { manager }
    }

    /// Apply a raw JSON message
    pub async fn apply(&self, message: &Value) -> UpdateOutcome {
        match serde_json::from_value::<EditorMessage>(message.clone()) {
            Ok(message) => self.apply_message(message).await,
            Err(e) => {
                tracing::error!("Malformed editor message: {}", e);
                UpdateOutcome::Malformed
            }
        }
    }

    /// Apply a parsed message
    pub async fn apply_message(&self, message: EditorMessage) -> UpdateOutcome {
        let (Some(cmd), Some(path)) = (
            message.cmd.filter(|cmd| !cmd.is_empty()),
            message.path.filter(|path| !path.is_empty()),
        ) else {
            tracing::error!("Not enough data received to update the page model");
            return UpdateOutcome::Malformed;
        };

        let Some(command) = EditorCommand::parse(&cmd) else {
            tracing::warn!("Unsupported editor command '{}' for {}", cmd, path);
            self.broadcast_loaded().await;
            return UpdateOutcome::Unsupported { cmd };
        };

        let needs_data = command != EditorCommand::Delete;
        let data = match message.data {
            Some(data) => data,
            None if needs_data => {
                tracing::error!("Editor command '{}' for {} carries no data", cmd, path);
                return UpdateOutcome::Malformed;
            }
            None => ItemData::default(),
        };

        let parent_path = parent_node_path(&path).map(str::to_string);
        let (result, notified_path) = match command {
            EditorCommand::Replace => {
                let result = self
                    .manager
                    .update_store(|store| store.set_data(&path, &data))
                    .await;
                (result, Some(path.clone()))
            }
            EditorCommand::Delete => {
                let result = self
                    .manager
                    .update_store(|store| store.remove_data(&path).map(|_| ()))
                    .await;
                (result, parent_path)
            }
            EditorCommand::InsertBefore | EditorCommand::InsertAfter => {
                let insert_before = command == EditorCommand::InsertBefore;
                let sibling = node_name(&path);

                let item_path = parent_path
                    .as_ref()
                    .map(|parent| format!("{}/{}", parent, data.key));

                match item_path {
                    Some(item_path) => {
                        let result = self
                            .manager
                            .update_store(|store| {
                                store.insert_data(&item_path, &data.value, sibling, insert_before)
                            })
                            .await;
                        (result, parent_path)
                    }
                    None => (Err(StoreError::invalid_path(path.as_str())), None),
                }
            }
        };

        if let Some(notified) = &notified_path {
            self.manager.notify_listeners(notified).await;
        }

        self.broadcast_loaded().await;

        match result {
            Ok(()) => {
                tracing::debug!("Applied editor command '{}' at {}", command.as_str(), path);
                UpdateOutcome::Applied { notified_path }
            }
            Err(error) => {
                tracing::warn!(
                    "Editor command '{}' at {} failed: {}",
                    command.as_str(),
                    path,
                    error
                );
                UpdateOutcome::Failed {
                    notified_path,
                    error,
                }
            }
        }
    }

    async fn broadcast_loaded(&self) {
        if let Some(model) = self.manager.read_store(|store| store.get_data(None)).await {
            self.manager.emit_event(ModelEvent::Loaded { model });
        }
    }

    /// Consume messages from `receiver` in a background task
    ///
    /// The task ends when the channel closes or the handle is shut down or
    /// dropped.
    pub fn spawn(manager: ModelManager, mut receiver: mpsc::Receiver<Value>) -> EditorClientHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let client = Self::new(manager);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = shutdown_rx.recv() => {
                        tracing::info!("EditorClient shutting down");
                        break;
                    }

                    message = receiver.recv() => {
                        let Some(message) = message else {
                            tracing::debug!("Editor message channel closed");
                            break;
                        };
                        client.apply(&message).await;
                    }
                }
            }
        });

        EditorClientHandle { shutdown_tx, task }
    }
}

/// Handle to a spawned editor message loop
#[derive(Debug)]
pub struct EditorClientHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl EditorClientHandle {
    /// Stop the loop and wait for it to exit
    ///
    /// Messages already queued but not yet taken are dropped.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!("EditorClient task failed: {}", e);
        }
    }

    /// Wait for the loop to end on its own (channel closed)
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!("EditorClient task failed: {}", e);
        }
    }
}
