//! Markup import graph resolution
//!
//! Parses `<link rel="import">` references transitively from every entry
//! point, recording for each module the set of entry points that reach it.
//! That reachability set is the whole basis of the dedup decision in
//! [`super::merge`]. Paths are stored relative to the site root; hrefs
//! resolve relative to the importing document.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("unresolved import: {path}")]
    UnresolvedImport { path: PathBuf },

    #[error("failed to read module {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One markup document in the import graph. Owned exclusively by the graph
/// for the duration of a build and never mutated after resolution.
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub path: PathBuf,
    /// Ordered import references, site-root relative.
    pub imports: Vec<PathBuf>,
    /// Document markup with the import link tags stripped.
    pub body: String,
    pub is_entry: bool,
}

/// The fully resolved import graph below a set of entry points.
#[derive(Debug, Default)]
pub struct ImportManifest {
    pub entry_points: Vec<PathBuf>,
    pub nodes: BTreeMap<PathBuf, ModuleNode>,
    /// Entry points that transitively reach each node.
    pub reachability: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    /// Global first-reach order, imports before importers. Drives both
    /// inlining order and the shared bundle counting scheme.
    pub first_reach_order: Vec<PathBuf>,
}

impl ImportManifest {
    /// Walk every entry point's import graph. Excluded paths are dropped
    /// entirely: never read, never recorded, never reported missing. A
    /// missing import anywhere else fails the whole bundle step.
    pub fn generate(
        root: &Path,
        entry_points: &[PathBuf],
        excludes: &[PathBuf],
    ) -> Result<Self, BundleError> {
        let exclude_set: BTreeSet<&PathBuf> = excludes.iter().collect();
        let entry_set: BTreeSet<&PathBuf> = entry_points.iter().collect();

        let mut manifest = ImportManifest {
            entry_points: entry_points.to_vec(),
            ..ImportManifest::default()
        };
        let mut ordered = BTreeSet::new();

        for entry in entry_points {
            let mut visited = BTreeSet::new();
            walk(
                root,
                entry,
                entry,
                &entry_set,
                &exclude_set,
                &mut manifest,
                &mut ordered,
                &mut visited,
            )?;
        }
        Ok(manifest)
    }
}

#[allow(clippy::too_many_arguments)]
fn walk(
    root: &Path,
    path: &PathBuf,
    entry: &PathBuf,
    entries: &BTreeSet<&PathBuf>,
    excludes: &BTreeSet<&PathBuf>,
    manifest: &mut ImportManifest,
    ordered: &mut BTreeSet<PathBuf>,
    visited: &mut BTreeSet<PathBuf>,
) -> Result<(), BundleError> {
    if excludes.contains(path) || !visited.insert(path.clone()) {
        return Ok(());
    }

    if !manifest.nodes.contains_key(path) {
        let node = parse_module(root, path, entries.contains(path))?;
        manifest.nodes.insert(path.clone(), node);
    }
    manifest
        .reachability
        .entry(path.clone())
        .or_default()
        .insert(entry.clone());

    let imports = manifest.nodes[path].imports.clone();
    for import in &imports {
        walk(root, import, entry, entries, excludes, manifest, ordered, visited)?;
    }

    if ordered.insert(path.clone()) {
        manifest.first_reach_order.push(path.clone());
    }
    Ok(())
}

fn import_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<link\s[^>]*rel=["']import["'][^>]*>\s*"#).unwrap())
}

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"href=["']([^"']+)["']"#).unwrap())
}

fn parse_module(root: &Path, path: &PathBuf, is_entry: bool) -> Result<ModuleNode, BundleError> {
    let full = root.join(path);
    let raw = std::fs::read_to_string(&full).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            BundleError::UnresolvedImport { path: path.clone() }
        } else {
            BundleError::Io {
                path: path.clone(),
                source,
            }
        }
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let mut imports = Vec::new();
    for link in import_link_re().find_iter(&raw) {
        if let Some(href) = href_re().captures(link.as_str()).map(|c| c[1].to_string()) {
            imports.push(resolve_href(base, &href));
        }
    }
    let body = import_link_re().replace_all(&raw, "").into_owned();

    Ok(ModuleNode {
        path: path.clone(),
        imports,
        body,
        is_entry,
    })
}

/// Resolve an href against the importing document's directory, collapsing
/// `.` and `..` segments. A leading `/` is site-root relative.
pub fn resolve_href(base: &Path, href: &str) -> PathBuf {
    let joined = if let Some(rooted) = href.strip_prefix('/') {
        PathBuf::from(rooted)
    } else {
        base.join(href)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
