//! Shared test utilities for integration tests
//!
//! Provides a scriptable `ResourceFetcher` that records per-URL request
//! counts and a start/finish event log, with an optional per-request delay so
//! tests can observe overlapping in-flight windows.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use velox_loader::descriptor::{LibraryDescriptor, ResourceKind};
use velox_loader::error::LoaderError;
use velox_loader::fetch::ResourceFetcher;

/// Fetcher that records every request and can be scripted to delay or fail
pub struct RecordingFetcher {
    delay: Option<Duration>,
    delays: Mutex<HashMap<String, Duration>>,
    texts: Mutex<HashMap<String, String>>,
    failures: Mutex<HashMap<String, usize>>,
    counts: Mutex<HashMap<String, usize>>,
    events: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self {
            delay: None,
            delays: Mutex::new(HashMap::new()),
            texts: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            counts: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Sleep for `delay` inside every request, between its start and finish
    /// events
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep for `delay` inside requests for `url` only, overriding the
    /// fetcher-wide delay
    pub fn delay_for(self, url: &str, delay: Duration) -> Self {
        self.delays.lock().insert(url.to_string(), delay);
        self
    }

    /// Serve `body` for `url` on the text path
    pub fn with_text(self, url: &str, body: &str) -> Self {
        self.texts.lock().insert(url.to_string(), body.to_string());
        self
    }

    /// Fail the next `times` requests for `url`
    pub fn fail_times(self, url: &str, times: usize) -> Self {
        self.failures.lock().insert(url.to_string(), times);
        self
    }

    /// Number of requests observed for `url`
    pub fn fetch_count(&self, url: &str) -> usize {
        self.counts.lock().get(url).copied().unwrap_or(0)
    }

    /// All requests observed so far
    pub fn total_fetches(&self) -> usize {
        self.counts.lock().values().sum()
    }

    /// Index of the first event containing `needle`, panicking when absent
    pub fn event_index(&self, needle: &str) -> usize {
        let events = self.events.lock();
        events
            .iter()
            .position(|event| event.contains(needle))
            .unwrap_or_else(|| panic!("no event containing '{}' in {:?}", needle, *events))
    }

    async fn simulate(&self, url: &str) -> Result<(), LoaderError> {
        self.events.lock().push(format!("start {}", url));
        *self.counts.lock().entry(url.to_string()).or_insert(0) += 1;

        let delay = self.delays.lock().get(url).copied().or(self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failed = {
            let mut failures = self.failures.lock();
            match failures.get_mut(url) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };

        self.events.lock().push(format!("finish {}", url));

        if failed {
            Err(LoaderError::FetchFailed {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ResourceFetcher for RecordingFetcher {
    async fn fetch_script(&self, url: &str) -> Result<(), LoaderError> {
        self.simulate(url).await
    }

    async fn fetch_style(&self, url: &str) -> Result<(), LoaderError> {
        self.simulate(url).await
    }

    async fn fetch_text(&self, url: &str) -> Result<String, LoaderError> {
        self.simulate(url).await?;
        Ok(self
            .texts
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| format!("body of {}", url)))
    }
}

/// Script descriptor resolving to `/static/<name>.js`
pub fn script(name: &str) -> LibraryDescriptor {
    LibraryDescriptor::new(name, "1.0.0").with_local_path(format!("/static/{}.js", name))
}

/// Style descriptor resolving to `/static/<name>.css`
pub fn style(name: &str) -> LibraryDescriptor {
    LibraryDescriptor::new(name, "1.0.0")
        .with_kind(ResourceKind::Style)
        .with_local_path(format!("/static/{}.css", name))
}

/// The URL a `script(name)` descriptor resolves to
pub fn script_url(name: &str) -> String {
    format!("/static/{}.js?version=1.0.0", name)
}
