//! Pipeline context for managing dependencies and accumulated results

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::bundler::BundleInfo;
use crate::catalog::SceneCatalog;
use crate::compiler::{CompileResult, Compiler};
use crate::config::{BuildConfig, SiteLayout};
use crate::manifest::Manifest;
use crate::progress::{NoOpHandler, ProgressHandler};

/// Context that owns all long-lived pipeline dependencies plus the state
/// phases hand to each other.
pub struct BuildContext {
    /// Scene registry loaded from the catalog file
    pub catalog: SceneCatalog,

    /// Options for this build invocation
    pub config: BuildConfig,

    /// Directory shape of the site being built
    pub layout: SiteLayout,

    /// Compiler backend driving scene optimization
    pub compiler: Arc<dyn Compiler>,

    /// Progress sink for per-scene events
    pub progress: Arc<dyn ProgressHandler>,

    /// Resolved compile set (requested scenes plus transitive dependencies)
    pub compile_set: BTreeSet<String>,

    /// Per-scene compile results, in scene order
    pub compile_results: Vec<CompileResult>,

    /// Bundle entry points, site-relative
    pub entry_points: Vec<PathBuf>,

    /// Merged documents awaiting fanout, keyed by site-relative path
    pub documents: BTreeMap<PathBuf, String>,

    /// Resolved bundle composition, keyed by output document path
    pub bundles: BTreeMap<PathBuf, BundleInfo>,

    /// Localized pages written under the output directory
    pub written_pages: Vec<PathBuf>,

    /// Version manifest of the final tree, once built
    pub manifest: Option<Manifest>,
}

impl BuildContext {
    pub fn new(
        catalog: SceneCatalog,
        config: BuildConfig,
        layout: SiteLayout,
        compiler: Arc<dyn Compiler>,
    ) -> Self {
        Self {
            catalog,
            config,
            layout,
            compiler,
            progress: Arc::new(NoOpHandler),
            compile_set: BTreeSet::new(),
            compile_results: Vec::new(),
            entry_points: Vec::new(),
            documents: BTreeMap::new(),
            bundles: BTreeMap::new(),
            written_pages: Vec::new(),
            manifest: None,
        }
    }

    /// Attach a progress handler for per-scene events.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    /// Output directory for this build.
    pub fn output_dir(&self) -> PathBuf {
        self.layout.output_dir(&self.config)
    }
}
