//! Error types for the asset loader.

use thiserror::Error;

/// Loader errors
///
/// Clonable so that a single episode outcome can be delivered to every
/// caller waiting on the same library.
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No source location for library '{name}' under the {policy} policy")]
    MissingLocation { name: String, policy: String },

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Fetch for {url} returned status {status}: {body}")]
    FetchStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Load episode for '{0}' ended without an outcome")]
    EpisodeAbandoned(String),

    #[error("Listener for '{name}' failed: {reason}")]
    Listener { name: String, reason: String },
}
