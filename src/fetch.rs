//! Resource Fetcher
//!
//! The seam between the loader and the hosting environment: one capability to
//! inject executable and style elements, one to fetch text content by URL.
//! The loader treats implementations as black boxes that report success or
//! failure exactly once per request. Ships an HTTP implementation backed by
//! `reqwest`; tests substitute their own.

use crate::error::LoaderError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Capability to retrieve the resources a loader needs
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Retrieve and inject an executable script, resolving once it is
    /// available to the hosting environment.
    async fn fetch_script(&self, url: &str) -> Result<(), LoaderError>;

    /// Retrieve and inject a stylesheet.
    async fn fetch_style(&self, url: &str) -> Result<(), LoaderError>;

    /// Fetch plain-text content.
    async fn fetch_text(&self, url: &str) -> Result<String, LoaderError>;
}

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// Map transport-level failures to loader errors
fn map_http_error(url: &str, error: reqwest::Error) -> LoaderError {
    let reason = if error.is_timeout() {
        format!("request timeout: {}", error)
    } else if error.is_connect() {
        format!("connection error: {}", error)
    } else {
        format!("http error: {}", error)
    };
    LoaderError::FetchFailed {
        url: url.to_string(),
        reason,
    }
}

/// HTTP-backed resource fetcher
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, LoaderError> {
        let client = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                LoaderError::Config(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }

    /// Use an externally configured client (custom timeouts, proxies)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get_checked(&self, url: &str) -> Result<reqwest::Response, LoaderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_http_error(url, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LoaderError::FetchStatus {
                url: url.to_string(),
                status,
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch_script(&self, url: &str) -> Result<(), LoaderError> {
        // Retrieval is the loader's responsibility; evaluation belongs to
        // the hosting environment.
        self.get_checked(url).await?;
        Ok(())
    }

    async fn fetch_style(&self, url: &str) -> Result<(), LoaderError> {
        self.get_checked(url).await?;
        Ok(())
    }

    async fn fetch_text(&self, url: &str) -> Result<String, LoaderError> {
        let response = self.get_checked(url).await?;
        response.text().await.map_err(|e| LoaderError::FetchFailed {
            url: url.to_string(),
            reason: format!("failed to read body: {}", e),
        })
    }
}

// Scriptable fetcher for unit tests
#[cfg(test)]
pub struct MockFetcher {
    texts: parking_lot::Mutex<std::collections::HashMap<String, String>>,
    failures: parking_lot::Mutex<std::collections::HashMap<String, usize>>,
    counts: parking_lot::Mutex<std::collections::HashMap<String, usize>>,
}

#[cfg(test)]
impl MockFetcher {
    pub fn new() -> Self {
        Self {
            texts: parking_lot::Mutex::new(std::collections::HashMap::new()),
            failures: parking_lot::Mutex::new(std::collections::HashMap::new()),
            counts: parking_lot::Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Serve `body` for `url` on the text path
    pub fn with_text(self, url: &str, body: &str) -> Self {
        self.texts.lock().insert(url.to_string(), body.to_string());
        self
    }

    /// Fail the next `times` requests for `url`
    pub fn failing(self, url: &str, times: usize) -> Self {
        self.failures.lock().insert(url.to_string(), times);
        self
    }

    /// Number of requests observed for `url`
    pub fn fetch_count(&self, url: &str) -> usize {
        self.counts.lock().get(url).copied().unwrap_or(0)
    }

    fn record(&self, url: &str) -> Result<(), LoaderError> {
        *self.counts.lock().entry(url.to_string()).or_insert(0) += 1;
        let mut failures = self.failures.lock();
        if let Some(remaining) = failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(LoaderError::FetchFailed {
                    url: url.to_string(),
                    reason: "scripted failure".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[async_trait]
impl ResourceFetcher for MockFetcher {
    async fn fetch_script(&self, url: &str) -> Result<(), LoaderError> {
        self.record(url)
    }

    async fn fetch_style(&self, url: &str) -> Result<(), LoaderError> {
        self.record(url)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, LoaderError> {
        self.record(url)?;
        Ok(self
            .texts
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| format!("body of {}", url)))
    }
}
