//! Bundle phase: merge the markup import graph into output documents
//!
//! Merged documents stay in memory for the fanout phase; only their
//! extracted scripts and the compiled scene code land on disk here,
//! because neither is localized.

use crate::bundler::{self, extract_scripts, minify, ImportManifest, SHARED_BUNDLE_DIR};
use crate::pipeline::context::BuildContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub struct BundlePhase;

#[async_trait]
impl WorkflowPhase for BundlePhase {
    async fn execute(&self, context: &mut BuildContext) -> Result<()> {
        let entry_points = bundler::discover_entry_points(&context.layout);
        if entry_points.is_empty() {
            warn!("No bundle entry points found, nothing to bundle");
            return Ok(());
        }

        let manifest = ImportManifest::generate(
            context.layout.root(),
            &entry_points,
            &context.config.excludes,
        )
        .context("Failed to walk markup import graph")?;
        let output = bundler::bundle(&manifest, SHARED_BUNDLE_DIR);

        info!(
            entry_points = entry_points.len(),
            modules = manifest.nodes.len(),
            shared_bundles = output.generated(&entry_points).len(),
            "Merged import graph"
        );

        let output_dir = context.output_dir();
        for (path, html) in &output.documents {
            let split = extract_scripts(path, html);
            let html = if context.config.pretty {
                split.html
            } else {
                minify(&split.html)
            };

            if let Some(script) = split.script {
                let script_path = match path.parent() {
                    Some(parent) => output_dir.join(parent).join(&script.file_name),
                    None => output_dir.join(&script.file_name),
                };
                write_file(&script_path, script.code.as_bytes())?;
            }
            context.documents.insert(path.clone(), html);
        }
        context.bundles = output.bundles;

        // Compiled scene code ships verbatim next to its scene page.
        for result in &context.compile_results {
            let rel = result
                .output_path
                .strip_prefix(context.layout.root())
                .unwrap_or(&result.output_path);
            let bytes = fs::read(&result.output_path).with_context(|| {
                format!("Failed to read compiled scene {}", result.scene_id)
            })?;
            write_file(&output_dir.join(rel), &bytes)?;
        }

        context.entry_points = entry_points;
        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}
