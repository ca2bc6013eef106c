//! Loader Facade
//!
//! Composes the resolver, fetcher, library registry, listener registry, and
//! sequencing primitives into the public loading surface: load one library,
//! load a plan of ordered/parallel steps, or load plain text with caching.
//! All bookkeeping lives in instance state behind a mutex that is never held
//! across an await.

use crate::config::LoaderOptions;
use crate::descriptor::{LibraryDescriptor, LoadedResource, ResourceKind};
use crate::error::LoaderError;
use crate::fetch::ResourceFetcher;
use crate::listener::{ListenerRegistry, LoadListener};
use crate::plan::{Plan, PlanStep};
use crate::registry::{BeginLoad, LibraryRegistry};
use crate::resolve::resolve_url;
use crate::sequence::{run_all, run_in_order};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Default)]
struct LoaderState {
    registry: LibraryRegistry,
    listeners: ListenerRegistry,
    styles: HashMap<String, DateTime<Utc>>,
    text_cache: HashMap<String, String>,
}

/// Owner of a started script episode
///
/// `complete` consumes the guard and records the outcome. Dropping the guard
/// without completing means the owning future was cancelled mid-fetch; the
/// drop fails the episode so queued waiters resolve with an error and the
/// name returns to unloaded, eligible for retry.
struct EpisodeGuard<'a> {
    loader: &'a AssetLoader,
    name: &'a str,
    completed: bool,
}

impl<'a> EpisodeGuard<'a> {
    fn new(loader: &'a AssetLoader, name: &'a str) -> Self {
        Self {
            loader,
            name,
            completed: false,
        }
    }

    fn complete(mut self, outcome: Result<LoadedResource, LoaderError>) {
        self.completed = true;
        self.loader
            .state
            .lock()
            .registry
            .complete_load(self.name, outcome);
    }
}

impl Drop for EpisodeGuard<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        warn!(library = self.name, "script load abandoned mid-episode; clearing state");
        self.loader.state.lock().registry.complete_load(
            self.name,
            Err(LoaderError::EpisodeAbandoned(self.name.to_string())),
        );
    }
}

/// The asset loader
///
/// Owns all load state; construct one per hosting environment and share it
/// by reference. Caches are append-only for the lifetime of the loader.
pub struct AssetLoader {
    fetcher: Arc<dyn ResourceFetcher>,
    options: LoaderOptions,
    state: Mutex<LoaderState>,
    in_flight: AtomicUsize,
}

impl AssetLoader {
    /// Create a loader with default options (CDN resolution)
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            options: LoaderOptions::default(),
            state: Mutex::new(LoaderState::default()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Create a loader with explicit options
    ///
    /// Fails fast if the options are invalid, e.g. a path-based policy
    /// without the corresponding path.
    pub fn with_options(
        fetcher: Arc<dyn ResourceFetcher>,
        options: LoaderOptions,
    ) -> Result<Self, LoaderError> {
        options.validate()?;
        Ok(Self {
            fetcher,
            options: options.normalized(),
            state: Mutex::new(LoaderState::default()),
            in_flight: AtomicUsize::new(0),
        })
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Number of top-level `load` calls currently in flight (observability
    /// only)
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Whether `library` has finished loading
    pub fn is_loaded(&self, library: &str) -> bool {
        let state = self.state.lock();
        state.registry.is_loaded(library) || state.styles.contains_key(library)
    }

    /// Register a listener invoked every time `library` finishes loading
    pub fn add_listener(&self, library: &str, listener: Arc<dyn LoadListener>) {
        self.state.lock().listeners.add(library, listener);
    }

    /// Remove the first matching registration of `listener` for `library`
    pub fn remove_listener(&self, library: &str, listener: &Arc<dyn LoadListener>) {
        self.state.lock().listeners.remove(library, listener);
    }

    /// Execute a loading plan
    ///
    /// Steps run strictly in order; descriptors within a step run
    /// concurrently. Returns one result list per step.
    pub async fn load(
        &self,
        plan: impl Into<Plan>,
    ) -> Result<Vec<Vec<LoadedResource>>, LoaderError> {
        let plan: Plan = plan.into();
        let gauge = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(in_flight = gauge, steps = plan.len(), "starting load plan");

        let outcome = run_in_order(plan.steps.iter().map(|step| self.run_step(step))).await;

        let gauge = self.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        match &outcome {
            Ok(results) => debug!(in_flight = gauge, steps = results.len(), "load plan finished"),
            Err(error) => warn!(in_flight = gauge, error = %error, "load plan failed"),
        }
        outcome
    }

    async fn run_step(&self, step: &PlanStep) -> Result<Vec<LoadedResource>, LoaderError> {
        run_all(step.descriptors().iter().map(|library| self.load_one(library))).await
    }

    /// Load a single library, dispatching on its kind
    pub async fn load_one(
        &self,
        library: &LibraryDescriptor,
    ) -> Result<LoadedResource, LoaderError> {
        let url = resolve_url(library, &self.options)?;
        match library.kind {
            ResourceKind::Style => self.load_style(library, &url).await,
            ResourceKind::Json => self.load_json(&url).await,
            ResourceKind::Plain => self.load_text(&url).await.map(LoadedResource::Text),
            ResourceKind::Script => self.load_script(library, &url).await,
        }
    }

    /// Load plain text, caching successful responses by URL
    ///
    /// A cached URL is served without another fetch for the lifetime of the
    /// loader.
    pub async fn load_text(&self, url: &str) -> Result<String, LoaderError> {
        if let Some(cached) = self.state.lock().text_cache.get(url) {
            debug!(url, "text cache hit");
            return Ok(cached.clone());
        }

        let body = self.fetcher.fetch_text(url).await?;
        self.state
            .lock()
            .text_cache
            .insert(url.to_string(), body.clone());
        Ok(body)
    }

    /// Load a JSON document through the text cache
    ///
    /// A body that fails to parse is passed through as raw text rather than
    /// surfaced as an error.
    pub async fn load_json(&self, url: &str) -> Result<LoadedResource, LoaderError> {
        let body = self.load_text(url).await?;
        match serde_json::from_str(&body) {
            Ok(value) => Ok(LoadedResource::Json(value)),
            Err(error) => {
                debug!(url, error = %error, "response is not valid JSON; passing raw text through");
                Ok(LoadedResource::Text(body))
            }
        }
    }

    /// Load a stylesheet
    ///
    /// Styles are one-shot: the name is marked loaded before the fetch and a
    /// failed fetch does not clear the mark, so each style name is attempted
    /// at most once per loader and `is_loaded` reports true from the first
    /// attempt on. Failures still propagate to the caller.
    async fn load_style(
        &self,
        library: &LibraryDescriptor,
        url: &str,
    ) -> Result<LoadedResource, LoaderError> {
        {
            let mut state = self.state.lock();
            if state.styles.contains_key(&library.name) {
                debug!(library = %library.name, "style already loaded");
                return Ok(LoadedResource::Style);
            }
            // Marked before the fetch; style injection is fire-and-forget.
            state.styles.insert(library.name.clone(), Utc::now());
        }

        self.fetcher.fetch_style(url).await?;
        self.emit(&library.name).await?;
        Ok(LoadedResource::Style)
    }

    async fn load_script(
        &self,
        library: &LibraryDescriptor,
        url: &str,
    ) -> Result<LoadedResource, LoaderError> {
        let begin = self.state.lock().registry.begin_load(&library.name);
        match begin {
            BeginLoad::AlreadyLoaded(resource) => {
                debug!(library = %library.name, "script already loaded");
                Ok(resource)
            }
            BeginLoad::InFlight(episode) => {
                debug!(library = %library.name, "joining in-flight script load");
                episode
                    .await
                    .map_err(|_| LoaderError::EpisodeAbandoned(library.name.clone()))?
            }
            BeginLoad::Started => {
                let guard = EpisodeGuard::new(self, &library.name);
                info!(library = %library.name, url, "loading script");
                match self.fetcher.fetch_script(url).await {
                    Ok(()) => {
                        guard.complete(Ok(LoadedResource::Script));
                        self.emit(&library.name).await?;
                        Ok(LoadedResource::Script)
                    }
                    Err(error) => {
                        warn!(library = %library.name, url, error = %error, "script load failed");
                        // Clear the episode so a later call can retry.
                        guard.complete(Err(error.clone()));
                        Err(error)
                    }
                }
            }
        }
    }

    /// Run every listener registered for `library`, in series over a
    /// snapshot of the registration list
    async fn emit(&self, library: &str) -> Result<(), LoaderError> {
        let snapshot = self.state.lock().listeners.snapshot(library);
        let mut units = Vec::new();
        for listener in snapshot {
            units.push(async move { listener.on_load(library).await });
        }
        run_in_order(units).await?;
        Ok(())
    }
}
