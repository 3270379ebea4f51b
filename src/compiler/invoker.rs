//! Drives the optimizer per scene, honoring the invalidation cache
//!
//! The invoker is the only writer of compiled scene output and the only
//! reader of the cache tracker besides the tracker itself. It builds the
//! per-scene job from the catalog entry, consults the cache, invokes the
//! compiler when needed, applies the output wrapper and records the
//! configuration fingerprint.

use super::{CompileJob, Compiler, CompilerFailure, Diagnostic};
use crate::cache::CacheTracker;
use crate::catalog::SceneConfig;
use crate::compiler::flags::CompilerFlags;
use crate::config::{BuildConfig, SiteLayout};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("scene '{scene_id}' failed to compile")]
    Scene {
        scene_id: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("compiler toolchain failure while building scene '{scene_id}': {message}")]
    Toolchain { scene_id: String, message: String },

    #[error("failed to write compiled output for scene '{scene_id}'")]
    Io {
        scene_id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Whether the target was rebuilt or found fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Compiled,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct CompileResult {
    pub scene_id: String,
    pub output_path: PathBuf,
    pub outcome: CompileOutcome,
}

/// The configuration slice the cache fingerprints: everything that affects
/// compiler output except the source file contents themselves.
#[derive(Serialize)]
struct FingerprintInput<'a> {
    flags: &'a CompilerFlags,
    libraries: &'a [PathBuf],
    must_compile: bool,
}

pub struct CompilerInvoker {
    compiler: Arc<dyn Compiler>,
    tracker: CacheTracker,
}

impl CompilerInvoker {
    pub fn new(compiler: Arc<dyn Compiler>, tracker: CacheTracker) -> Self {
        Self { compiler, tracker }
    }

    /// Compile one target, or skip it when its output is up to date.
    pub async fn compile(&self, job: &CompileJob) -> Result<CompileResult, CompileError> {
        let fingerprint = CacheTracker::fingerprint(&FingerprintInput {
            flags: &job.flags,
            libraries: &job.libraries,
            must_compile: job.must_compile,
        });

        let inputs = job.input_files();
        if !self
            .tracker
            .is_stale(&job.scene_id, &fingerprint, &job.output_path, &inputs)
        {
            debug!(scene = %job.scene_id, "scene up to date, skipping compile");
            return Ok(CompileResult {
                scene_id: job.scene_id.clone(),
                output_path: job.output_path.clone(),
                outcome: CompileOutcome::Skipped,
            });
        }

        let output = match self.compiler.compile(job).await {
            Ok(output) => output,
            Err(CompilerFailure::Diagnostics(diagnostics)) => {
                return Err(CompileError::Scene {
                    scene_id: job.scene_id.clone(),
                    diagnostics,
                });
            }
            Err(CompilerFailure::Internal(message)) => {
                return Err(CompileError::Toolchain {
                    scene_id: job.scene_id.clone(),
                    message,
                });
            }
        };

        // Advisory only; a warning never fails an iterative build.
        for warning in &output.warnings {
            warn!(scene = %job.scene_id, "compiler warning: {}", warning);
        }

        let wrapped = job.flags.wrap(&output.code);
        if let Some(parent) = job.output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CompileError::Io {
                scene_id: job.scene_id.clone(),
                source,
            })?;
        }
        std::fs::write(&job.output_path, wrapped).map_err(|source| CompileError::Io {
            scene_id: job.scene_id.clone(),
            source,
        })?;

        if let Err(err) = self.tracker.record(&job.scene_id, &fingerprint) {
            // A failed marker write only costs a rebuild next time.
            warn!(scene = %job.scene_id, error = %err, "failed to record cache marker");
        }

        if job.must_compile {
            info!(scene = %job.scene_id, "Compiled scene");
        } else {
            info!(scene = %job.scene_id, "Fast transpiled");
        }

        Ok(CompileResult {
            scene_id: job.scene_id.clone(),
            output_path: job.output_path.clone(),
            outcome: CompileOutcome::Compiled,
        })
    }
}

/// Target id the core site scripts compile under; shares the cache and
/// result plumbing with scene targets.
pub const CORE_TARGET: &str = "core";

/// Build the compile job for the core site scripts, if the site has any.
/// These always take the aggressive optimizer pass and the window wrapper.
pub fn core_job(layout: &SiteLayout, build: &BuildConfig) -> Option<CompileJob> {
    let sources = collect_js(&layout.core_js_dir(), usize::MAX);
    if sources.is_empty() {
        return None;
    }

    let externs = collect_js(&layout.externs_dir(), 1);
    Some(CompileJob {
        scene_id: CORE_TARGET.to_string(),
        sources,
        libraries: Vec::new(),
        must_compile: true,
        output_path: layout.core_js_dir().join("core.min.js"),
        flags: CompilerFlags::for_core(externs, build.pretty),
    })
}

/// Build the compile job for a scene from its catalog entry and the site
/// layout.
pub fn scene_job(
    scene_id: &str,
    config: &SceneConfig,
    layout: &SiteLayout,
    build: &BuildConfig,
) -> CompileJob {
    let scene_dir = layout.scenes_dir().join(scene_id);

    let mut sources = collect_js(&scene_dir.join("js"), usize::MAX);
    sources.extend(collect_js(&layout.scenes_dir().join("shared/js"), 1));

    let mut libraries = Vec::new();
    for spec in &config.libraries {
        libraries.extend(resolve_library(layout.root(), spec));
    }

    let externs = collect_js(&layout.externs_dir(), 1);
    let flags = CompilerFlags::for_scene(scene_id, config, externs, build.force_compile, build.pretty);

    CompileJob {
        scene_id: scene_id.to_string(),
        sources,
        libraries,
        must_compile: config.must_compile(build.force_compile),
        output_path: scene_dir.join(format!("{}-scene.min.js", scene_id)),
        flags,
    }
}

/// Collect `.js` files under a directory, skipping already-compiled
/// `.min.js` output. Sorted for deterministic job construction.
fn collect_js(dir: &Path, max_depth: usize) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension().and_then(|e| e.to_str()) == Some("js")
                && !p
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.ends_with(".min.js"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Resolve a declared library spec. A spec is either a concrete file, a
/// directory (taken recursively), or a glob whose wildcard tail selects
/// scripts under its literal directory prefix.
fn resolve_library(root: &Path, spec: &str) -> Vec<PathBuf> {
    let literal_prefix: PathBuf = Path::new(spec)
        .components()
        .take_while(|c| !c.as_os_str().to_string_lossy().contains('*'))
        .collect();

    let base = root.join(&literal_prefix);
    if base.is_file() {
        return vec![base];
    }
    collect_js(&base, usize::MAX)
}
