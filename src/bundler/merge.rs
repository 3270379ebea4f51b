//! Eager merge with shared-bundle extraction
//!
//! Every module lands in exactly one output document: modules reached by a
//! single entry point inline into it in first-reaching import order, and
//! modules reached by two or more entry points are grouped by their
//! reachability set into counted shared bundles. Referrers emit one import
//! link to the shared bundle at the point of first reference.

use super::graph::ImportManifest;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One resolved output bundle: the entry points that require it and the
/// module files merged into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleInfo {
    pub entrypoints: BTreeSet<PathBuf>,
    pub files: BTreeSet<PathBuf>,
}

#[derive(Debug, Default)]
pub struct BundleOutput {
    /// Merged markup per output document path.
    pub documents: BTreeMap<PathBuf, String>,
    pub bundles: BTreeMap<PathBuf, BundleInfo>,
}

impl BundleOutput {
    /// Output documents that are not entry points, i.e. generated shared
    /// bundles.
    pub fn generated(&self, entry_points: &[PathBuf]) -> Vec<&PathBuf> {
        self.documents
            .keys()
            .filter(|path| !entry_points.contains(path))
            .collect()
    }
}

/// Where a module ends up.
enum Placement<'a> {
    /// Inlined into the referencing document.
    Inline,
    /// It is an entry point of its own; referrers link to it.
    Entry,
    /// Extracted into the given shared bundle.
    Shared(&'a Path),
}

pub fn bundle(manifest: &ImportManifest, shared_dir: &str) -> BundleOutput {
    // Group shared modules by reachability set, numbering groups in global
    // first-reach order so repeated builds produce identical names.
    let mut assignment: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
    let mut groups: BTreeMap<PathBuf, (BTreeSet<PathBuf>, Vec<PathBuf>)> = BTreeMap::new();
    let mut group_order: Vec<PathBuf> = Vec::new();
    let mut group_by_reach: BTreeMap<BTreeSet<PathBuf>, PathBuf> = BTreeMap::new();

    for path in &manifest.first_reach_order {
        let node = &manifest.nodes[path];
        let reach = &manifest.reachability[path];
        if node.is_entry || reach.len() < 2 {
            continue;
        }
        let bundle_path = group_by_reach.entry(reach.clone()).or_insert_with(|| {
            let name = PathBuf::from(format!(
                "{}/shared_bundle_{}.html",
                shared_dir,
                group_order.len() + 1
            ));
            group_order.push(name.clone());
            groups.insert(name.clone(), (reach.clone(), Vec::new()));
            name
        });
        assignment.insert(path.clone(), bundle_path.clone());
        groups.get_mut(bundle_path).unwrap().1.push(path.clone());
    }

    let mut output = BundleOutput::default();

    // Entry-point documents.
    for entry in &manifest.entry_points {
        let mut doc = String::new();
        let mut visited = BTreeSet::new();
        let mut linked = BTreeSet::new();
        emit(
            manifest,
            &assignment,
            entry,
            entry,
            &mut visited,
            &mut linked,
            &mut doc,
        );
        output.bundles.insert(
            entry.clone(),
            BundleInfo {
                entrypoints: BTreeSet::from([entry.clone()]),
                files: visited,
            },
        );
        output.documents.insert(entry.clone(), doc);
    }

    // Generated shared bundles, in counting order.
    for bundle_path in &group_order {
        let (reach, members) = &groups[bundle_path];
        let mut doc = String::new();
        let mut visited = BTreeSet::new();
        let mut linked = BTreeSet::new();
        for member in members {
            emit(
                manifest,
                &assignment,
                bundle_path,
                member,
                &mut visited,
                &mut linked,
                &mut doc,
            );
        }
        debug!(
            bundle = %bundle_path.display(),
            entrypoints = reach.len(),
            files = visited.len(),
            "generated shared bundle"
        );
        output.bundles.insert(
            bundle_path.clone(),
            BundleInfo {
                entrypoints: reach.clone(),
                files: visited,
            },
        );
        output.documents.insert(bundle_path.clone(), doc);
    }

    output
}

/// Append a module and its imports to a document, depth first, imports
/// before body, with visited-set dedup so importing a module twice never
/// duplicates its content.
fn emit(
    manifest: &ImportManifest,
    assignment: &BTreeMap<PathBuf, PathBuf>,
    doc_path: &PathBuf,
    node_path: &PathBuf,
    visited: &mut BTreeSet<PathBuf>,
    linked: &mut BTreeSet<PathBuf>,
    out: &mut String,
) {
    if !visited.insert(node_path.clone()) {
        return;
    }
    let node = &manifest.nodes[node_path];

    for import in &node.imports {
        // Excluded imports were dropped at graph generation time.
        let Some(target) = manifest.nodes.get(import) else {
            continue;
        };

        let placement = if target.is_entry {
            Placement::Entry
        } else {
            match assignment.get(import) {
                Some(bundle) if bundle == doc_path => Placement::Inline,
                Some(bundle) => Placement::Shared(bundle),
                None => Placement::Inline,
            }
        };

        match placement {
            Placement::Inline => {
                emit(manifest, assignment, doc_path, import, visited, linked, out);
            }
            Placement::Entry => {
                push_link(doc_path, import, linked, out);
            }
            Placement::Shared(bundle) => {
                let bundle = bundle.to_path_buf();
                push_link(doc_path, &bundle, linked, out);
            }
        }
    }

    out.push_str(&node.body);
    if !node.body.ends_with('\n') {
        out.push('\n');
    }
}

fn push_link(doc_path: &Path, target: &PathBuf, linked: &mut BTreeSet<PathBuf>, out: &mut String) {
    if !linked.insert(target.clone()) {
        return;
    }
    out.push_str(&format!(
        "<link rel=\"import\" href=\"{}\">\n",
        rel_href(doc_path, target)
    ));
}

/// Relative href from one site-relative document to another.
pub fn rel_href(from_doc: &Path, to: &Path) -> String {
    let from_dir: Vec<_> = from_doc
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .components()
        .collect();
    let to_parts: Vec<_> = to.components().collect();

    let common = from_dir
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); from_dir.len() - common];
    parts.extend(
        to_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}
