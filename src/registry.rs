//! Library Registry
//!
//! Per-library load state machine: `Unloaded -> Loading -> Loaded`, with
//! failed episodes returning to `Unloaded` so a later attempt can retry.
//! At most one `Loading` episode exists per name at any time; callers that
//! arrive while an episode is in flight are queued as waiters and all receive
//! the episode's outcome, in registration order.

use crate::descriptor::LoadedResource;
use crate::error::LoaderError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::oneshot;
use tracing::debug;

/// Receiver handed to a waiter joining an in-flight episode
pub type EpisodeReceiver = oneshot::Receiver<Result<LoadedResource, LoaderError>>;

#[derive(Debug)]
enum LoadState {
    Loading {
        since: DateTime<Utc>,
        waiters: Vec<oneshot::Sender<Result<LoadedResource, LoaderError>>>,
    },
    Loaded {
        at: DateTime<Utc>,
        resource: LoadedResource,
    },
}

/// Outcome of asking the registry to begin loading a library
#[derive(Debug)]
pub enum BeginLoad {
    /// No episode was in flight; the caller now owns the episode and must
    /// call `complete_load` with its outcome.
    Started,
    /// The library finished loading earlier; the cached result is returned.
    AlreadyLoaded(LoadedResource),
    /// An episode is in flight; the caller was queued as a waiter and will
    /// receive the episode's outcome on this channel.
    InFlight(EpisodeReceiver),
}

/// Tracks load state and the waiter list per library name
#[derive(Debug, Default)]
pub struct LibraryRegistry {
    states: HashMap<String, LoadState>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a load episode for `name`, or join one already in flight
    pub fn begin_load(&mut self, name: &str) -> BeginLoad {
        match self.states.get_mut(name) {
            Some(LoadState::Loaded { resource, .. }) => {
                BeginLoad::AlreadyLoaded(resource.clone())
            }
            Some(LoadState::Loading { waiters, .. }) => {
                let (sender, receiver) = oneshot::channel();
                waiters.push(sender);
                BeginLoad::InFlight(receiver)
            }
            None => {
                self.states.insert(
                    name.to_string(),
                    LoadState::Loading {
                        since: Utc::now(),
                        waiters: Vec::new(),
                    },
                );
                BeginLoad::Started
            }
        }
    }

    /// End the active episode for `name` and fan the outcome out to every
    /// queued waiter, in registration order.
    ///
    /// Success caches the resource; failure clears the state so a later
    /// attempt retries. Calling this with no active episode is a no-op
    /// safeguard.
    pub fn complete_load(&mut self, name: &str, outcome: Result<LoadedResource, LoaderError>) {
        let waiters = match self.states.remove(name) {
            Some(LoadState::Loading { waiters, .. }) => waiters,
            Some(loaded @ LoadState::Loaded { .. }) => {
                self.states.insert(name.to_string(), loaded);
                debug!(library = name, "complete_load on a loaded library; ignoring");
                return;
            }
            None => {
                debug!(library = name, "complete_load without an active episode; ignoring");
                return;
            }
        };

        if let Ok(resource) = &outcome {
            self.states.insert(
                name.to_string(),
                LoadState::Loaded {
                    at: Utc::now(),
                    resource: resource.clone(),
                },
            );
        }

        for waiter in waiters {
            // A waiter that gave up and dropped its receiver is fine.
            let _ = waiter.send(outcome.clone());
        }
    }

    /// Whether `name` has finished loading
    pub fn is_loaded(&self, name: &str) -> bool {
        matches!(self.states.get(name), Some(LoadState::Loaded { .. }))
    }

    /// Whether an episode for `name` is in flight
    pub fn is_loading(&self, name: &str) -> bool {
        matches!(self.states.get(name), Some(LoadState::Loading { .. }))
    }

    /// Cached result of a completed load, if any
    pub fn loaded(&self, name: &str) -> Option<LoadedResource> {
        match self.states.get(name) {
            Some(LoadState::Loaded { resource, .. }) => Some(resource.clone()),
            _ => None,
        }
    }

    /// When `name` finished loading, if it has
    pub fn loaded_at(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.states.get(name) {
            Some(LoadState::Loaded { at, .. }) => Some(*at),
            _ => None,
        }
    }

    /// When the in-flight episode for `name` started, if one exists
    pub fn loading_since(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.states.get(name) {
            Some(LoadState::Loading { since, .. }) => Some(*since),
            _ => None,
        }
    }
}
