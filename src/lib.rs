//! Velox Loader: De-duplicated, Ordered Asset Loading
//!
//! An asset loader for client applications: fetches scripts, stylesheets, JSON,
//! and plain-text resources, ensures each named library is loaded at most once,
//! and executes loading plans that mix strictly-ordered steps with parallel
//! groups. Interested parties can register listeners that run every time a
//! library finishes loading.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod fetch;
pub mod listener;
pub mod loader;
pub mod logging;
pub mod plan;
pub mod registry;
pub mod resolve;
pub mod sequence;
