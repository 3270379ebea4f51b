//! scenery - build orchestration for scene-based static content sites
//!
//! This library turns a loosely-coupled tree of "scene" modules (games,
//! drawing tools, animations) into a versioned, cache-efficient static
//! artifact set. The heavy lifting happens in five stages:
//!
//! - **Catalog**: resolve which scenes to compile from a declarative
//!   registry, expanding transitive dependencies
//! - **Compile**: drive the external optimizing compiler per scene with
//!   scene-specific flags, skipping targets whose inputs and configuration
//!   are unchanged
//! - **Bundle**: merge the markup import graph into per-entry documents,
//!   extracting modules shared by multiple entry points into counted
//!   shared bundles
//! - **Fanout**: expand every output page into one variant per locale
//! - **Manifest**: hash the final tree into a version manifest clients use
//!   to detect updates
//!
//! The [`pipeline::PipelineOrchestrator`] is the only component aware of
//! this ordering; everything else is a function from declared inputs to
//! declared outputs plus cache side effects.

// Public modules
pub mod bundler;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod i18n;
pub mod manifest;
pub mod pipeline;
pub mod progress;

// Re-export key types for convenient access
pub use bundler::{BundleError, BundleOutput, ImportManifest};
pub use cache::CacheTracker;
pub use catalog::{CatalogError, SceneCatalog, SceneConfig};
pub use compiler::{CompileError, CompileJob, Compiler, CompilerInvoker};
pub use config::{BuildConfig, BuildMode, SiteLayout};
pub use i18n::{FanoutEngine, FanoutError, TranslationTable};
pub use manifest::{Manifest, ManifestEntry, ManifestError};
pub use pipeline::{BuildContext, PipelineOrchestrator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_scenery() {
        assert_eq!(NAME, "scenery");
    }
}
