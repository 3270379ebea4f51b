//! Scene catalog: the declarative registry of every scene the site ships
//!
//! Loaded once at build start from `scenes.toml` and immutable thereafter.
//! The catalog is an explicit value handed to the pipeline at construction
//! time; nothing reads it ambiently.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors raised while loading or resolving the catalog. All of these are
/// fatal before any build work starts.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown scene: {0}")]
    UnknownScene(String),

    #[error("failed to read scene catalog at {path}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed scene catalog: {0}")]
    Malformed(#[from] toml::de::Error),
}

/// One catalog entry. A scene without an entry point is configuration-only
/// (for example a pure dependency carrier) and is never compiled itself.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    /// Root symbol the optimizer treats as the compilation entry point.
    #[serde(default)]
    pub entry_point: Option<String>,

    /// Other scene ids this scene needs compiled alongside it.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Extra pre-compiled library globs fed to the optimizer.
    #[serde(default)]
    pub libraries: Vec<String>,

    /// Scene depends on the full support framework, not just its base shim.
    #[serde(default)]
    pub closure_library: bool,

    /// Scene is served as a standalone frame; its output is not wrapped
    /// into the shared scene namespace.
    #[serde(default)]
    pub is_frame: bool,

    /// Opt-out for the stricter diagnostic set. Defaults to true.
    #[serde(default = "default_true")]
    pub type_safe: bool,

    /// Whether the scene's page participates in locale fanout.
    /// Defaults to true.
    #[serde(default = "default_true")]
    pub fanout: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            entry_point: None,
            dependencies: Vec::new(),
            libraries: Vec::new(),
            closure_library: false,
            is_frame: false,
            type_safe: true,
            fanout: true,
        }
    }
}

impl SceneConfig {
    /// A scene must go through the real optimizer (rather than the fast
    /// whitespace pass) when it declares extra libraries, depends on the
    /// full framework, or is served as a standalone frame.
    pub fn must_compile(&self, force: bool) -> bool {
        force || !self.libraries.is_empty() || self.closure_library || self.is_frame
    }
}

/// The immutable scene registry.
#[derive(Debug, Clone, Default)]
pub struct SceneCatalog {
    scenes: BTreeMap<String, SceneConfig>,
}

impl SceneCatalog {
    /// Load the catalog from a `scenes.toml` file. The file is a flat table
    /// keyed by scene id:
    ///
    /// ```toml
    /// [boatload]
    /// entry_point = "app.Game"
    /// dependencies = ["shared-frame"]
    /// ```
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        let scenes: BTreeMap<String, SceneConfig> = toml::from_str(&raw)?;
        Ok(Self { scenes })
    }

    /// Build a catalog directly from entries. Intended for tests and
    /// embedding.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, SceneConfig)>) -> Self {
        Self {
            scenes: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&SceneConfig> {
        self.scenes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SceneConfig)> {
        self.scenes.iter()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene ids whose page participates in locale fanout.
    pub fn fanout_scenes(&self) -> BTreeSet<String> {
        self.scenes
            .iter()
            .filter(|(_, cfg)| cfg.fanout)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Resolve the requested scene names into the full compile set.
    ///
    /// An empty request selects every scene with an entry point. Otherwise
    /// each requested scene must exist; the result contains it (when it has
    /// an entry point) plus its declared dependencies, transitively.
    /// Dependency cycles terminate through the visited set and are logged,
    /// not rejected: a cycle is almost certainly a configuration bug, but
    /// it violates no invariant of this resolver.
    pub fn resolve(&self, requested: &[String]) -> Result<BTreeSet<String>, CatalogError> {
        if requested.is_empty() {
            return Ok(self
                .scenes
                .iter()
                .filter(|(_, cfg)| cfg.entry_point.is_some())
                .map(|(id, _)| id.clone())
                .collect());
        }

        let mut out = BTreeSet::new();
        let mut visited = BTreeSet::new();
        for name in requested {
            if !self.scenes.contains_key(name) {
                return Err(CatalogError::UnknownScene(name.clone()));
            }
            self.expand(name, &mut visited, &mut out, &mut Vec::new())?;
        }
        Ok(out)
    }

    fn expand(
        &self,
        id: &str,
        visited: &mut BTreeSet<String>,
        out: &mut BTreeSet<String>,
        stack: &mut Vec<String>,
    ) -> Result<(), CatalogError> {
        if stack.iter().any(|s| s == id) {
            warn!(scene = %id, "dependency cycle in scene catalog");
            return Ok(());
        }
        if !visited.insert(id.to_string()) {
            return Ok(());
        }

        let config = self
            .scenes
            .get(id)
            .ok_or_else(|| CatalogError::UnknownScene(id.to_string()))?;

        if config.entry_point.is_some() {
            out.insert(id.to_string());
        }

        stack.push(id.to_string());
        for dep in &config.dependencies {
            self.expand(dep, visited, out, stack)?;
        }
        stack.pop();
        Ok(())
    }
}
