//! Configuration System
//!
//! Resolution policy and loader options, plus an optional file-based
//! configuration entry point with environment variable overrides. Options are
//! validated eagerly so that a misconfigured loader fails at construction
//! time, never in the middle of a load plan.

use crate::error::LoaderError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How library locations are resolved when a descriptor carries no
/// explicit `local_path`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPolicy {
    /// Resolve through each descriptor's CDN template (default)
    #[default]
    Cdn,
    /// Resolve through a local package directory plus each descriptor's
    /// package path template
    PackagePath,
}

impl ResolutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::Cdn => "cdn",
            ResolutionPolicy::PackagePath => "package-path",
        }
    }
}

/// Loader options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderOptions {
    /// Resolution policy, defaults to CDN
    #[serde(default)]
    pub policy: ResolutionPolicy,

    /// Root of the local package directory, required by the
    /// `package-path` policy
    #[serde(default)]
    pub package_path: Option<String>,
}

impl LoaderOptions {
    /// Options resolving every library through its CDN template
    pub fn cdn() -> Self {
        Self::default()
    }

    /// Options resolving libraries under a local package directory
    pub fn package_path(path: impl Into<String>) -> Self {
        Self {
            policy: ResolutionPolicy::PackagePath,
            package_path: Some(path.into()),
        }
    }

    /// Validate the options
    ///
    /// Fails if a path-based policy is selected without the corresponding
    /// path.
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.policy == ResolutionPolicy::PackagePath && self.package_path.is_none() {
            return Err(LoaderError::Config(
                "the package-path policy requires a package_path".to_string(),
            ));
        }
        Ok(())
    }

    /// Normalize the configured package path to end with a single slash so
    /// templates can be appended directly.
    pub fn normalized(mut self) -> Self {
        if let Some(path) = self.package_path.take() {
            let trimmed = path.trim_end_matches('/');
            self.package_path = Some(format!("{}/", trimmed));
        }
        self
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VeloxConfig {
    /// Loader options
    #[serde(default)]
    pub loader: LoaderOptions,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VeloxConfig {
    /// Load configuration from an optional TOML file plus `VELOX_*`
    /// environment overrides (e.g. `VELOX_LOADER__POLICY=package-path`).
    pub fn load(path: Option<&Path>) -> Result<Self, LoaderError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("VELOX").separator("__"));

        let raw = builder
            .build()
            .map_err(|e| LoaderError::Config(format!("Failed to read configuration: {}", e)))?;

        let parsed: VeloxConfig = raw
            .try_deserialize()
            .map_err(|e| LoaderError::Config(format!("Invalid configuration: {}", e)))?;

        parsed.loader.validate()?;

        Ok(VeloxConfig {
            loader: parsed.loader.normalized(),
            logging: parsed.logging,
        })
    }
}
