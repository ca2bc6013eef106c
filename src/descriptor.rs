//! Library descriptors
//!
//! The declarative record describing one loadable resource: a name, a kind,
//! a version, and location templates the resolver turns into a fetchable URL.
//! Identity is the `name`; descriptors with the same name refer to the same
//! library and the first successful load wins.

use serde::{Deserialize, Serialize};

/// Kind of resource a descriptor points at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Executable script, loaded at most once per name (default)
    #[default]
    Script,
    /// Stylesheet, injected at most once per name
    Style,
    /// JSON document, cached by URL and parsed on arrival
    Json,
    /// Plain text, cached by URL
    Plain,
}

/// Declarative description of one loadable library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDescriptor {
    /// Library name (identity)
    pub name: String,

    /// Resource kind, defaults to `script`
    #[serde(default)]
    pub kind: ResourceKind,

    /// Version, substituted into location templates and appended as a
    /// cache-busting query parameter
    pub version: String,

    /// CDN location template; `$VERSION` is replaced by `version`
    #[serde(default)]
    pub cdn_template: Option<String>,

    /// Location template relative to the configured package path
    #[serde(default)]
    pub package_path_template: Option<String>,

    /// Explicit location, overriding all policy-based resolution
    #[serde(default)]
    pub local_path: Option<String>,
}

impl LibraryDescriptor {
    /// Create a script descriptor with no location templates
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Script,
            version: version.into(),
            cdn_template: None,
            package_path_template: None,
            local_path: None,
        }
    }

    pub fn with_kind(mut self, kind: ResourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_cdn_template(mut self, template: impl Into<String>) -> Self {
        self.cdn_template = Some(template.into());
        self
    }

    pub fn with_package_path_template(mut self, template: impl Into<String>) -> Self {
        self.package_path_template = Some(template.into());
        self
    }

    pub fn with_local_path(mut self, path: impl Into<String>) -> Self {
        self.local_path = Some(path.into());
        self
    }
}

/// Result of a completed load, cached per library name (scripts, styles)
/// or per URL (text, JSON).
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedResource {
    /// Script was injected into the hosting environment
    Script,
    /// Stylesheet was injected into the hosting environment
    Style,
    /// Plain-text body, also the fallback for unparseable JSON
    Text(String),
    /// Parsed JSON document
    Json(serde_json::Value),
}
