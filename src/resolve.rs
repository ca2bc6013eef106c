//! Library location resolution
//!
//! Pure string templating that turns a descriptor plus the configured policy
//! into a fetchable URL. Kept free of any load state so it can be tested in
//! isolation.

use crate::config::{LoaderOptions, ResolutionPolicy};
use crate::descriptor::LibraryDescriptor;
use crate::error::LoaderError;

/// Placeholder replaced by the descriptor's version in location templates
pub const VERSION_PLACEHOLDER: &str = "$VERSION";

/// Resolve the URL for a library
///
/// An explicit `local_path` overrides everything. Otherwise the configured
/// policy selects the CDN template or the package path plus the descriptor's
/// package path template. The version is substituted into the template and
/// appended as a `?version=` query parameter for cache busting.
pub fn resolve_url(
    library: &LibraryDescriptor,
    options: &LoaderOptions,
) -> Result<String, LoaderError> {
    let base = if let Some(local) = &library.local_path {
        local.clone()
    } else {
        match options.policy {
            ResolutionPolicy::Cdn => library
                .cdn_template
                .clone()
                .ok_or_else(|| missing_location(library, options.policy))?,
            ResolutionPolicy::PackagePath => {
                let root = options.package_path.as_deref().ok_or_else(|| {
                    LoaderError::Config(
                        "the package-path policy requires a package_path".to_string(),
                    )
                })?;
                let template = library
                    .package_path_template
                    .as_deref()
                    .ok_or_else(|| missing_location(library, options.policy))?;
                format!("{}{}", root, template)
            }
        }
    };

    let substituted = base.replace(VERSION_PLACEHOLDER, &library.version);
    Ok(format!("{}?version={}", substituted, library.version))
}

fn missing_location(library: &LibraryDescriptor, policy: ResolutionPolicy) -> LoaderError {
    LoaderError::MissingLocation {
        name: library.name.clone(),
        policy: policy.as_str().to_string(),
    }
}
