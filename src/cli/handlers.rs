//! Command handlers
//!
//! Each handler turns parsed arguments into a build run and maps the
//! outcome to a process exit code.

use super::commands::{BuildArgs, ScenesArgs};
use crate::catalog::SceneCatalog;
use crate::compiler::{Compiler, ProcessCompiler};
use crate::config::{BuildConfig, SiteLayout};
use crate::pipeline::{BuildContext, PipelineOrchestrator};
use crate::progress::LoggingHandler;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Compiler used when neither `--compiler` nor `SCENERY_COMPILER` is set.
const DEFAULT_COMPILER: &str = "closure-compiler";

pub async fn handle_build(args: &BuildArgs) -> i32 {
    match run_build(args).await {
        Ok(pages) => {
            info!(pages = pages.len(), "Build succeeded");
            0
        }
        Err(err) => {
            error!("Build failed: {:#}", err);
            eprintln!("Build failed: {:#}", err);
            1
        }
    }
}

pub async fn handle_scenes(args: &ScenesArgs) -> i32 {
    match list_scenes(args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Failed to list scenes: {:#}", err);
            1
        }
    }
}

async fn run_build(args: &BuildArgs) -> Result<Vec<PathBuf>> {
    let root = site_root(&args.site_root)?;
    let layout = SiteLayout::new(&root);
    let catalog = SceneCatalog::load(&layout.catalog_file())
        .with_context(|| format!("Failed to load scene catalog from {}", root.display()))?;

    let mut config = BuildConfig::new()
        .with_mode(args.mode.into())
        .with_scenes(args.scenes.clone())
        .with_force_compile(args.compile)
        .with_strict_i18n(args.strict)
        .with_pretty(args.pretty)
        .with_jobs(args.jobs);
    if let Some(tag) = &args.build_tag {
        config = config.with_version(tag);
    }

    let mut context = BuildContext::new(catalog, config, layout, resolve_compiler(args))
        .with_progress(Arc::new(LoggingHandler));
    let orchestrator = PipelineOrchestrator::new(Some(Arc::new(LoggingHandler)));
    orchestrator.execute(&mut context).await
}

fn list_scenes(args: &ScenesArgs) -> Result<()> {
    let root = site_root(&args.site_root)?;
    let layout = SiteLayout::new(&root);
    let catalog = SceneCatalog::load(&layout.catalog_file())
        .with_context(|| format!("Failed to load scene catalog from {}", root.display()))?;

    println!("{:<20} {:<10} {:<8} {}", "SCENE", "COMPILE", "FANOUT", "ENTRY POINT");
    for (id, scene) in catalog.iter() {
        println!(
            "{:<20} {:<10} {:<8} {}",
            id,
            if scene.must_compile(false) { "full" } else { "fast" },
            if scene.fanout { "yes" } else { "no" },
            scene.entry_point.as_deref().unwrap_or("-"),
        );
    }
    println!("\n{} scene(s)", catalog.len());
    Ok(())
}

fn site_root(arg: &Option<PathBuf>) -> Result<PathBuf> {
    match arg {
        Some(path) => Ok(path.clone()),
        None => env::current_dir().context("Failed to determine current directory"),
    }
}

/// Pick the compiler backend: an explicit `--compiler` path wins, then the
/// `SCENERY_COMPILER` environment variable, then `closure-compiler` on PATH.
/// A `.jar` path is run through the JVM.
fn resolve_compiler(args: &BuildArgs) -> Arc<dyn Compiler> {
    let program = args
        .compiler
        .clone()
        .or_else(|| env::var_os("SCENERY_COMPILER").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_COMPILER));

    if program.extension().and_then(|e| e.to_str()) == Some("jar") {
        Arc::new(ProcessCompiler::jvm(program))
    } else {
        Arc::new(ProcessCompiler::new(program))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: BuildArgs,
    }

    fn build_args(argv: &[&str]) -> BuildArgs {
        let mut full = vec!["scenery"];
        full.extend_from_slice(argv);
        Wrapper::parse_from(full).args
    }

    #[test]
    fn test_site_root_defaults_to_cwd() {
        let root = site_root(&None).unwrap();
        assert!(root.is_absolute());
    }

    #[test]
    fn test_resolve_compiler_jar_uses_jvm() {
        let args = build_args(&["--compiler", "/opt/compiler.jar"]);
        // Only checks the branch taken; the backend is opaque.
        let _compiler = resolve_compiler(&args);
        assert_eq!(
            args.compiler.unwrap().extension().unwrap().to_str(),
            Some("jar")
        );
    }

    #[tokio::test]
    async fn test_build_fails_without_catalog() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = build_args(&[dir.path().to_str().unwrap()]);
        assert_eq!(handle_build(&args).await, 1);
    }

    #[tokio::test]
    async fn test_scenes_fails_without_catalog() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = ScenesArgs {
            site_root: Some(dir.path().to_path_buf()),
        };
        assert_eq!(handle_scenes(&args).await, 1);
    }
}
