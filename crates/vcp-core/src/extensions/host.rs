//! Extension host

use super::lifecycle::{ExtensionLifecycle, ExtensionState};
use super::{Extension, ExtensionError, ExtensionResult};
use crate::hub::{HubApi, Message};
use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Registered extension and its lifecycle
struct ExtensionEntry {
    extension: Arc<dyn Extension>,
    lifecycle: Mutex<ExtensionLifecycle>,
    load_order: usize,
}

impl ExtensionEntry {
    fn state(&self) -> ExtensionState {
        self.lifecycle.lock().state()
    }

    fn transition(&self, state: ExtensionState, reason: Option<String>) {
        if let Err(e) = self.lifecycle.lock().transition(state, reason) {
            tracing::warn!(extension = %self.extension.id(), error = %e, "unexpected extension state change");
        }
    }

    fn info(&self) -> ExtensionInfo {
        ExtensionInfo {
            id: self.extension.id().to_string(),
            name: self.extension.name().to_string(),
            state: self.state(),
            load_order: self.load_order,
        }
    }
}

/// Summary of a registered extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    pub id: String,
    pub name: String,
    pub state: ExtensionState,
    pub load_order: usize,
}

/// Holds the hub's extensions
///
/// Uses `DashMap` for the directory; entry locks are synchronous and never
/// held across an await. Extension calls run on cloned `Arc`s.
#[derive(Default)]
pub struct ExtensionHost {
    extensions: DashMap<String, Arc<ExtensionEntry>>,
    load_order: AtomicUsize,
}

impl ExtensionHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register and initialize an extension
    ///
    /// An extension whose `initialize` fails is removed again.
    pub async fn register(&self, extension: Arc<dyn Extension>, api: HubApi) -> ExtensionResult<()> {
        let id = extension.id().to_string();
        let entry = Arc::new(ExtensionEntry {
            extension: extension.clone(),
            lifecycle: Mutex::new(ExtensionLifecycle::new()),
            load_order: self.load_order.fetch_add(1, Ordering::SeqCst),
        });

        match self.extensions.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(ExtensionError::AlreadyRegistered(id));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(entry.clone());
            }
        }

        entry.transition(ExtensionState::Initializing, None);
        let outcome = guarded(&id, extension.initialize(api)).await;

        match outcome {
            Ok(()) => {
                entry.transition(ExtensionState::Active, None);
                tracing::info!(extension = %id, name = %extension.name(), "extension registered");
                Ok(())
            }
            Err(e) => {
                entry.transition(ExtensionState::Failed, Some(e.to_string()));
                self.extensions.remove(&id);
                tracing::error!(extension = %id, error = %e, "extension failed to initialize");
                Err(ExtensionError::InitFailed {
                    id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Remove an extension and run its cleanup
    pub async fn unregister(&self, id: &str) -> ExtensionResult<()> {
        let (_, entry) = self
            .extensions
            .remove(id)
            .ok_or_else(|| ExtensionError::NotFound(id.to_string()))?;
        shutdown_entry(&entry).await;
        Ok(())
    }

    /// Forward a message to every active extension in load order
    ///
    /// Failures are logged and never stop delivery to the remaining extensions.
    pub async fn dispatch(&self, message: &Message) {
        for entry in self.active_entries() {
            let id = entry.extension.id().to_string();
            if let Err(e) = guarded(&id, entry.extension.on_message(message)).await {
                tracing::warn!(
                    extension = %id,
                    message_type = %message.message_type,
                    error = %e,
                    "extension failed to handle message"
                );
            }
        }
    }

    /// Clean up every extension in reverse load order
    pub async fn shutdown_all(&self) {
        let mut entries: Vec<Arc<ExtensionEntry>> =
            self.extensions.iter().map(|r| r.value().clone()).collect();
        self.extensions.clear();
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.load_order));

        for entry in entries {
            shutdown_entry(&entry).await;
        }
    }

    /// Registered extensions in load order
    pub fn list(&self) -> Vec<ExtensionInfo> {
        let mut infos: Vec<ExtensionInfo> = self.extensions.iter().map(|r| r.info()).collect();
        infos.sort_by_key(|info| info.load_order);
        infos
    }

    pub fn contains(&self, id: &str) -> bool {
        self.extensions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    fn active_entries(&self) -> Vec<Arc<ExtensionEntry>> {
        let mut entries: Vec<Arc<ExtensionEntry>> = self
            .extensions
            .iter()
            .filter(|r| r.state().is_operational())
            .map(|r| r.value().clone())
            .collect();
        entries.sort_by_key(|entry| entry.load_order);
        entries
    }
}

async fn shutdown_entry(entry: &ExtensionEntry) {
    if !entry.state().needs_cleanup() {
        return;
    }
    let id = entry.extension.id().to_string();
    entry.transition(ExtensionState::ShuttingDown, None);
    match guarded(&id, entry.extension.cleanup()).await {
        Ok(()) => {
            entry.transition(ExtensionState::Stopped, None);
            tracing::info!(extension = %id, "extension stopped");
        }
        Err(e) => {
            entry.transition(ExtensionState::Failed, Some(e.to_string()));
            tracing::warn!(extension = %id, error = %e, "extension cleanup failed");
        }
    }
}

/// Run an extension callback, turning a panic into an error
async fn guarded<F>(id: &str, call: F) -> ExtensionResult<()>
where
    F: Future<Output = ExtensionResult<()>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(ExtensionError::Panicked {
            id: id.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
