//! Manifest phase: hash the finished output tree

use crate::manifest::Manifest;
use crate::pipeline::context::BuildContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

pub struct ManifestPhase;

#[async_trait]
impl WorkflowPhase for ManifestPhase {
    async fn execute(&self, context: &mut BuildContext) -> Result<()> {
        let output_dir = context.output_dir();
        let manifest = Manifest::build(&context.config.version, &output_dir)
            .context("Failed to hash output tree")?;
        manifest
            .write(&output_dir, context.config.pretty)
            .context("Failed to write version manifest")?;

        info!(
            version = %manifest.version,
            files = manifest.files.len(),
            "Wrote version manifest"
        );
        context.manifest = Some(manifest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SceneCatalog;
    use crate::compiler::MockCompiler;
    use crate::config::{BuildConfig, SiteLayout};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_manifest_phase_records_output_tree() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("dist_static/v1");
        fs::create_dir_all(out.join("scenes/a")).unwrap();
        fs::write(out.join("scenes/a/a-scene_en.html"), "<p>a</p>").unwrap();

        let mut ctx = BuildContext::new(
            SceneCatalog::default(),
            BuildConfig::default().with_version("v1"),
            SiteLayout::new(dir.path()),
            Arc::new(MockCompiler::new()),
        );

        ManifestPhase.execute(&mut ctx).await.unwrap();

        let manifest = ctx.manifest.unwrap();
        assert_eq!(manifest.version, "v1");
        assert_eq!(manifest.files.len(), 1);
        assert!(out.join("contents.json").is_file());
    }
}
