//! Listener Registry
//!
//! An ordered list of callbacks per library name, invoked every time that
//! library finishes loading. Registrations persist across load episodes until
//! explicitly removed. Emission iterates a snapshot of the list so listeners
//! can add or remove registrations without disturbing the round in progress.

use crate::error::LoaderError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked when a library finishes loading
///
/// Listeners run in series: each must complete before the next starts, and
/// the first error stops the round. A synchronous listener simply returns
/// without awaiting anything.
#[async_trait]
pub trait LoadListener: Send + Sync {
    async fn on_load(&self, library: &str) -> Result<(), LoaderError>;
}

/// Ordered listener lists keyed by library name
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<String, Vec<Arc<dyn LoadListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for `name`
    ///
    /// The same listener added twice is stored twice and fires twice.
    pub fn add(&mut self, name: &str, listener: Arc<dyn LoadListener>) {
        self.listeners
            .entry(name.to_string())
            .or_default()
            .push(listener);
    }

    /// Remove the first occurrence of `listener` registered for `name`
    ///
    /// Matching is by identity. Removing a listener that was never
    /// registered is a silent no-op.
    pub fn remove(&mut self, name: &str, listener: &Arc<dyn LoadListener>) {
        if let Some(list) = self.listeners.get_mut(name) {
            if let Some(position) = list.iter().position(|l| Arc::ptr_eq(l, listener)) {
                list.remove(position);
            }
        }
    }

    /// Snapshot of the listeners registered for `name`, in registration order
    pub fn snapshot(&self, name: &str) -> Vec<Arc<dyn LoadListener>> {
        self.listeners.get(name).cloned().unwrap_or_default()
    }

    /// Number of listeners registered for `name`
    pub fn count(&self, name: &str) -> usize {
        self.listeners.get(name).map(Vec::len).unwrap_or(0)
    }
}
