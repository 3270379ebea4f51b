//! Module graph bundling
//!
//! Resolves the markup import graph below a set of entry points into a
//! minimal set of output documents: modules used by a single entry point
//! are inlined into it, modules shared by two or more entry points are
//! extracted into counted shared bundles, and declared excludes are
//! dropped everywhere. After merging, embedded scripts are split into
//! sibling files and the markup is minified.

pub mod graph;
pub mod merge;
pub mod scripts;

pub use graph::{BundleError, ImportManifest, ModuleNode};
pub use merge::{bundle, BundleInfo, BundleOutput};
pub use scripts::{extract_scripts, minify, ExtractedScript, SplitDocument};

use crate::config::SiteLayout;
use std::path::PathBuf;
use walkdir::WalkDir;

/// The module every page of the site imports first.
pub const PRIMARY_MODULE: &str = "elements/elements.html";

/// Directory (site-relative) shared bundles are generated under.
pub const SHARED_BUNDLE_DIR: &str = "elements";

/// Discover bundle entry points: every scene page (`scenes/*/*-scene.html`)
/// plus the primary module. Scene pages come first so their import order
/// decides inlining, matching the order the site loads them in.
pub fn discover_entry_points(layout: &SiteLayout) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = WalkDir::new(layout.scenes_dir())
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.ends_with("-scene.html"))
                .unwrap_or(false)
        })
        .filter_map(|e| {
            e.path()
                .strip_prefix(layout.root())
                .ok()
                .map(|p| p.to_path_buf())
        })
        .collect();
    entries.sort();

    if layout.root().join(PRIMARY_MODULE).is_file() {
        entries.push(PathBuf::from(PRIMARY_MODULE));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_entry_points() {
        let dir = TempDir::new().unwrap();
        let layout = SiteLayout::new(dir.path());

        fs::create_dir_all(dir.path().join("scenes/a")).unwrap();
        fs::create_dir_all(dir.path().join("scenes/b")).unwrap();
        fs::create_dir_all(dir.path().join("elements")).unwrap();
        fs::write(dir.path().join("scenes/a/a-scene.html"), "<p>a</p>").unwrap();
        fs::write(dir.path().join("scenes/b/b-scene.html"), "<p>b</p>").unwrap();
        fs::write(dir.path().join("scenes/b/helper.html"), "<p>h</p>").unwrap();
        fs::write(dir.path().join("elements/elements.html"), "<p>e</p>").unwrap();

        let entries = discover_entry_points(&layout);
        assert_eq!(
            entries,
            vec![
                PathBuf::from("scenes/a/a-scene.html"),
                PathBuf::from("scenes/b/b-scene.html"),
                PathBuf::from(PRIMARY_MODULE),
            ]
        );
    }

    #[test]
    fn test_discover_without_primary_module() {
        let dir = TempDir::new().unwrap();
        let layout = SiteLayout::new(dir.path());
        fs::create_dir_all(dir.path().join("scenes/a")).unwrap();
        fs::write(dir.path().join("scenes/a/a-scene.html"), "<p>a</p>").unwrap();

        let entries = discover_entry_points(&layout);
        assert_eq!(entries, vec![PathBuf::from("scenes/a/a-scene.html")]);
    }
}
