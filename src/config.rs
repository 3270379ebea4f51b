//! Build configuration and site layout
//!
//! [`BuildConfig`] is the closed set of options a single build invocation
//! runs with; every knob has a documented default and there is no ambient
//! state. [`SiteLayout`] maps the fixed directory shape of a content site
//! (scenes, elements, messages, output) onto absolute paths.

use chrono::Utc;
use std::path::{Path, PathBuf};

/// Name of the scene catalog file at the site root.
pub const CATALOG_FILE: &str = "scenes.toml";

/// Build mode selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Compile-only iteration build; nothing is bundled or published.
    Dev,
    /// Full production build: compile, bundle, fanout, manifest.
    Prod,
}

/// Options for one build invocation.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Dev (compile only) or prod (full pipeline). Default: dev.
    pub mode: BuildMode,
    /// Requested scene subset; empty means every scene with an entry point.
    pub scenes: Vec<String>,
    /// Force the optimizer for every scene, even ones that could be
    /// fast-transpiled. Default: false.
    pub force_compile: bool,
    /// Fail the build on any missing translation. Default: false.
    pub strict_i18n: bool,
    /// Production build tag; becomes the versioned output directory name.
    pub version: String,
    /// Human-readable output: pretty-printed compiler output, no
    /// minification, unversioned output directory. Default: false.
    pub pretty: bool,
    /// Parallel compile workers; 0 means derive from available CPUs.
    pub jobs: usize,
    /// Module paths that must never appear in any bundle.
    pub excludes: Vec<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            mode: BuildMode::Dev,
            scenes: Vec::new(),
            force_compile: false,
            strict_i18n: false,
            version: default_version_tag(),
            pretty: false,
            jobs: 0,
            excludes: vec![PathBuf::from("elements/i18n-msg.html")],
        }
    }
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_scenes(mut self, scenes: Vec<String>) -> Self {
        self.scenes = scenes;
        self
    }

    pub fn with_force_compile(mut self, force: bool) -> Self {
        self.force_compile = force;
        self
    }

    pub fn with_strict_i18n(mut self, strict: bool) -> Self {
        self.strict_i18n = strict;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Bound on concurrent compiler invocations. The optimizer is CPU-heavy,
    /// so the default leaves two cores free for the rest of the pipeline.
    pub fn worker_limit(&self) -> usize {
        if self.jobs > 0 {
            return self.jobs;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .saturating_sub(2)
            .max(1)
    }
}

/// Default version tag is `vYYYYMMDDHHMM` in UTC.
pub fn default_version_tag() -> String {
    format!("v{}", Utc::now().format("%Y%m%d%H%M"))
}

/// Fixed directory shape of a content site, rooted at the project checkout.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    root: PathBuf,
}

impl SiteLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scene catalog file (`scenes.toml`).
    pub fn catalog_file(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }

    /// Per-scene source trees.
    pub fn scenes_dir(&self) -> PathBuf {
        self.root.join("scenes")
    }

    /// Shared markup elements, including the primary module.
    pub fn elements_dir(&self) -> PathBuf {
        self.root.join("elements")
    }

    /// Core site scripts, compiled as their own target.
    pub fn core_js_dir(&self) -> PathBuf {
        self.root.join("js")
    }

    /// Extern declaration files handed to the optimizer.
    pub fn externs_dir(&self) -> PathBuf {
        self.root.join("externs")
    }

    /// Translation message tables, one JSON file per locale.
    pub fn messages_dir(&self) -> PathBuf {
        self.root.join("_messages")
    }

    /// On-disk cache markers for compile targets.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(".scenery-cache")
    }

    /// Output directory for this build. Production output lands under a
    /// fresh versioned path so a failed build can never corrupt a
    /// previously published version.
    pub fn output_dir(&self, config: &BuildConfig) -> PathBuf {
        if config.pretty {
            self.root.join("dist_pretty")
        } else {
            self.root.join("dist_static").join(&config.version)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BuildConfig::default();
        assert_eq!(config.mode, BuildMode::Dev);
        assert!(config.scenes.is_empty());
        assert!(!config.force_compile);
        assert!(!config.strict_i18n);
        assert!(config.version.starts_with('v'));
        assert!(!config.pretty);
        assert_eq!(config.jobs, 0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = BuildConfig::new()
            .with_mode(BuildMode::Prod)
            .with_scenes(vec!["boatload".to_string()])
            .with_force_compile(true)
            .with_strict_i18n(true)
            .with_version("v202001010000")
            .with_pretty(true)
            .with_jobs(4);

        assert_eq!(config.mode, BuildMode::Prod);
        assert_eq!(config.scenes, vec!["boatload".to_string()]);
        assert!(config.force_compile);
        assert!(config.strict_i18n);
        assert_eq!(config.version, "v202001010000");
        assert!(config.pretty);
        assert_eq!(config.worker_limit(), 4);
    }

    #[test]
    fn test_worker_limit_never_zero() {
        let config = BuildConfig::default();
        assert!(config.worker_limit() >= 1);
    }

    #[test]
    fn test_default_version_tag_shape() {
        let tag = default_version_tag();
        assert_eq!(tag.len(), 13);
        assert!(tag.starts_with('v'));
        assert!(tag[1..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_layout_paths() {
        let layout = SiteLayout::new("/site");
        assert_eq!(layout.catalog_file(), PathBuf::from("/site/scenes.toml"));
        assert_eq!(layout.scenes_dir(), PathBuf::from("/site/scenes"));
        assert_eq!(layout.messages_dir(), PathBuf::from("/site/_messages"));
    }

    #[test]
    fn test_output_dir_versioned() {
        let layout = SiteLayout::new("/site");
        let config = BuildConfig::default().with_version("v202001010000");
        assert_eq!(
            layout.output_dir(&config),
            PathBuf::from("/site/dist_static/v202001010000")
        );
    }

    #[test]
    fn test_output_dir_pretty() {
        let layout = SiteLayout::new("/site");
        let config = BuildConfig::default().with_pretty(true);
        assert_eq!(layout.output_dir(&config), PathBuf::from("/site/dist_pretty"));
    }
}
