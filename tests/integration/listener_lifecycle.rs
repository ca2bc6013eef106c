//! Listener registration, ordering, and removal across load episodes

use super::test_utils::{script, style, RecordingFetcher};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use velox_loader::error::LoaderError;
use velox_loader::listener::LoadListener;
use velox_loader::loader::AssetLoader;

struct CountingListener {
    hits: AtomicUsize,
}

impl CountingListener {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            hits: AtomicUsize::new(0),
        })
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoadListener for CountingListener {
    async fn on_load(&self, _library: &str) -> Result<(), LoaderError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct TaggedListener {
    tag: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl LoadListener for TaggedListener {
    async fn on_load(&self, _library: &str) -> Result<(), LoaderError> {
        self.log.lock().push(self.tag);
        Ok(())
    }
}

#[tokio::test]
async fn test_listener_fires_once_per_completed_episode() {
    let loader = AssetLoader::new(Arc::new(RecordingFetcher::new()));
    let listener = CountingListener::new();
    loader.add_listener("jquery", listener.clone());

    loader.load_one(&script("jquery")).await.unwrap();
    assert_eq!(listener.hits(), 1);

    // Already loaded: no new episode, no second invocation.
    loader.load_one(&script("jquery")).await.unwrap();
    assert_eq!(listener.hits(), 1);
}

#[tokio::test]
async fn test_listeners_fire_in_registration_order() {
    let loader = AssetLoader::new(Arc::new(RecordingFetcher::new()));
    let log = Arc::new(Mutex::new(Vec::new()));

    loader.add_listener(
        "jquery",
        Arc::new(TaggedListener {
            tag: "first",
            log: log.clone(),
        }),
    );
    loader.add_listener(
        "jquery",
        Arc::new(TaggedListener {
            tag: "second",
            log: log.clone(),
        }),
    );

    loader.load_one(&script("jquery")).await.unwrap();
    assert_eq!(*log.lock(), vec!["first", "second"]);
}

#[tokio::test]
async fn test_removed_listener_never_fires_again() {
    let loader = AssetLoader::new(Arc::new(RecordingFetcher::new()));
    let listener = CountingListener::new();
    let as_dyn: Arc<dyn LoadListener> = listener.clone();

    loader.add_listener("jquery", as_dyn.clone());
    loader.remove_listener("jquery", &as_dyn);

    loader.load_one(&script("jquery")).await.unwrap();
    assert_eq!(listener.hits(), 0);
}

#[tokio::test]
async fn test_duplicate_registration_fires_twice() {
    let loader = AssetLoader::new(Arc::new(RecordingFetcher::new()));
    let listener = CountingListener::new();
    let as_dyn: Arc<dyn LoadListener> = listener.clone();

    loader.add_listener("jquery", as_dyn.clone());
    loader.add_listener("jquery", as_dyn);

    loader.load_one(&script("jquery")).await.unwrap();
    assert_eq!(listener.hits(), 2);
}

#[tokio::test]
async fn test_listener_does_not_fire_on_a_failed_episode() {
    let url = super::test_utils::script_url("flaky");
    let loader = AssetLoader::new(Arc::new(RecordingFetcher::new().fail_times(&url, 1)));
    let listener = CountingListener::new();
    loader.add_listener("flaky", listener.clone());

    assert!(loader.load_one(&script("flaky")).await.is_err());
    assert_eq!(listener.hits(), 0);

    // The registration survives the failed episode and fires on the
    // successful retry.
    loader.load_one(&script("flaky")).await.unwrap();
    assert_eq!(listener.hits(), 1);
}

#[tokio::test]
async fn test_listener_fires_for_styles() {
    let loader = AssetLoader::new(Arc::new(RecordingFetcher::new()));
    let listener = CountingListener::new();
    loader.add_listener("theme", listener.clone());

    loader.load_one(&style("theme")).await.unwrap();
    assert_eq!(listener.hits(), 1);

    // Repeat style loads are no-ops and emit nothing.
    loader.load_one(&style("theme")).await.unwrap();
    assert_eq!(listener.hits(), 1);
}

struct FailingListener;

#[async_trait]
impl LoadListener for FailingListener {
    async fn on_load(&self, library: &str) -> Result<(), LoaderError> {
        Err(LoaderError::Listener {
            name: library.to_string(),
            reason: "listener rejected the load".to_string(),
        })
    }
}

#[tokio::test]
async fn test_listener_failure_stops_the_round_in_series() {
    let loader = AssetLoader::new(Arc::new(RecordingFetcher::new()));
    let log = Arc::new(Mutex::new(Vec::new()));

    loader.add_listener(
        "jquery",
        Arc::new(TaggedListener {
            tag: "before",
            log: log.clone(),
        }),
    );
    loader.add_listener("jquery", Arc::new(FailingListener));
    loader.add_listener(
        "jquery",
        Arc::new(TaggedListener {
            tag: "after",
            log: log.clone(),
        }),
    );

    let result = loader.load_one(&script("jquery")).await;
    assert!(matches!(result, Err(LoaderError::Listener { .. })));

    // The listener after the failing one never ran.
    assert_eq!(*log.lock(), vec!["before"]);

    // The library itself still completed its episode.
    assert!(loader.is_loaded("jquery"));
}
