//! Compile phase: resolve the compile set and drive the optimizer
//!
//! Targets compile independently, so they run in parallel under a
//! semaphore sized by the worker limit: the core site scripts as one
//! target, each scene as another. The first failure aborts the build;
//! already-running targets finish their current invocation.

use crate::cache::CacheTracker;
use crate::compiler::{core_job, scene_job, CompileOutcome, CompilerInvoker};
use crate::pipeline::context::BuildContext;
use crate::pipeline::phase_trait::WorkflowPhase;
use crate::progress::ProgressEvent;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

pub struct CompilePhase;

#[async_trait]
impl WorkflowPhase for CompilePhase {
    async fn execute(&self, context: &mut BuildContext) -> Result<()> {
        let compile_set = context
            .catalog
            .resolve(&context.config.scenes)
            .context("Failed to resolve scene compile set")?;
        info!(scenes = compile_set.len(), "Resolved compile set");

        let invoker = Arc::new(CompilerInvoker::new(
            context.compiler.clone(),
            CacheTracker::new(context.layout.cache_dir()),
        ));
        let semaphore = Arc::new(Semaphore::new(context.config.worker_limit()));

        let mut jobs = Vec::with_capacity(compile_set.len() + 1);
        if let Some(job) = core_job(&context.layout, &context.config) {
            jobs.push(job);
        }
        for scene_id in &compile_set {
            let Some(scene_config) = context.catalog.get(scene_id) else {
                // resolve() already rejected unknown ids
                continue;
            };
            if scene_config.entry_point.is_none() {
                // pure dependency carrier, nothing of its own to compile
                continue;
            }
            jobs.push(scene_job(scene_id, scene_config, &context.layout, &context.config));
        }

        let mut tasks = Vec::with_capacity(jobs.len());
        for job in jobs {
            let invoker = invoker.clone();
            let semaphore = semaphore.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("compile semaphore closed");
                invoker.compile(&job).await
            }));
        }

        let total = tasks.len();
        for (index, joined) in join_all(tasks).await.into_iter().enumerate() {
            let result = joined.context("Compile worker panicked")??;
            context.progress.on_progress(&ProgressEvent::SceneCompiled {
                scene_id: result.scene_id.clone(),
                skipped: result.outcome == CompileOutcome::Skipped,
                index: index + 1,
                total,
            });
            context.compile_results.push(result);
        }

        let compiled = context
            .compile_results
            .iter()
            .filter(|r| r.outcome == CompileOutcome::Compiled)
            .count();
        info!(
            compiled,
            skipped = context.compile_results.len() - compiled,
            "Compile phase finished"
        );

        context.compile_set = compile_set;
        Ok(())
    }
}
