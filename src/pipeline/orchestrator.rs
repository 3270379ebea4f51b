use super::context::BuildContext;
use super::phase_trait::WorkflowPhase;
use super::phases::{BundlePhase, CompilePhase, FanoutPhase, ManifestPhase};
use crate::config::BuildMode;
use crate::progress::{ProgressEvent, ProgressHandler};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct PipelineOrchestrator {
    progress_handler: Option<Arc<dyn ProgressHandler>>,
}

impl PipelineOrchestrator {
    pub fn new(progress_handler: Option<Arc<dyn ProgressHandler>>) -> Self {
        Self { progress_handler }
    }

    pub async fn execute(&self, context: &mut BuildContext) -> Result<Vec<PathBuf>> {
        let start = Instant::now();
        info!(
            "Starting build pipeline for: {}",
            context.layout.root().display()
        );

        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&ProgressEvent::Started {
                site_root: context.layout.root().display().to_string(),
            });
        }

        let mut workflow_phases: Vec<(Box<dyn WorkflowPhase>, &str)> =
            vec![(Box::new(CompilePhase), "CompilePhase")];
        if context.config.mode == BuildMode::Prod {
            workflow_phases.push((Box::new(BundlePhase), "BundlePhase"));
            workflow_phases.push((Box::new(FanoutPhase), "FanoutPhase"));
            workflow_phases.push((Box::new(ManifestPhase), "ManifestPhase"));
        }

        for (phase, phase_name) in workflow_phases {
            info!("Phase: {}", phase_name);

            if let Some(handler) = &self.progress_handler {
                handler.on_progress(&ProgressEvent::PhaseStarted {
                    phase: phase_name.to_string(),
                });
            }

            let phase_start = Instant::now();
            if let Err(err) = phase
                .execute(context)
                .await
                .with_context(|| format!("Phase {} failed", phase_name))
            {
                if let Some(handler) = &self.progress_handler {
                    handler.on_progress(&ProgressEvent::Failed {
                        error: format!("{:#}", err),
                    });
                }
                return Err(err);
            }

            if let Some(handler) = &self.progress_handler {
                handler.on_progress(&ProgressEvent::PhaseComplete {
                    phase: phase_name.to_string(),
                    duration: phase_start.elapsed(),
                });
            }

            debug!("Phase {} complete", phase_name);
        }

        info!(
            "Pipeline complete: {} scene(s), {} page(s)",
            context.compile_results.len(),
            context.written_pages.len()
        );
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&ProgressEvent::Completed {
                scenes_built: context.compile_results.len(),
                pages_written: context.written_pages.len(),
                total_time: start.elapsed(),
            });
        }

        Ok(context.written_pages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SceneCatalog, SceneConfig};
    use crate::compiler::MockCompiler;
    use crate::config::{BuildConfig, SiteLayout};
    use crate::progress::LoggingHandler;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records one label per event so tests can assert on ordering.
    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<String>>,
    }

    impl RecordingHandler {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressHandler for RecordingHandler {
        fn on_progress(&self, event: &ProgressEvent) {
            let label = match event {
                ProgressEvent::Started { .. } => "started".to_string(),
                ProgressEvent::PhaseStarted { phase } => format!("start:{}", phase),
                ProgressEvent::PhaseComplete { phase, .. } => format!("done:{}", phase),
                ProgressEvent::SceneCompiled { scene_id, .. } => format!("scene:{}", scene_id),
                ProgressEvent::Completed { .. } => "completed".to_string(),
                ProgressEvent::Failed { .. } => "failed".to_string(),
            };
            self.events.lock().unwrap().push(label);
        }
    }

    fn site() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("scenes/boatload/js")).unwrap();
        fs::write(
            dir.path().join("scenes/boatload/js/game.js"),
            "app.Boatload = 1;\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("scenes/boatload/boatload-scene.html"),
            "<p>boatload</p>\n",
        )
        .unwrap();
        dir
    }

    fn context(dir: &TempDir, mock: Arc<MockCompiler>) -> BuildContext {
        let catalog = SceneCatalog::from_entries([(
            "boatload".to_string(),
            SceneConfig {
                entry_point: Some("app.Boatload".to_string()),
                ..SceneConfig::default()
            },
        )]);
        BuildContext::new(
            catalog,
            BuildConfig::default()
                .with_mode(BuildMode::Prod)
                .with_version("v1"),
            SiteLayout::new(dir.path()),
            mock,
        )
    }

    #[tokio::test]
    async fn test_orchestrator_creation() {
        let orchestrator = PipelineOrchestrator::new(None);
        assert!(orchestrator.progress_handler.is_none());

        let orchestrator = PipelineOrchestrator::new(Some(Arc::new(LoggingHandler)));
        assert!(orchestrator.progress_handler.is_some());
    }

    #[tokio::test]
    async fn test_phases_run_in_order_with_events() {
        let dir = site();
        let mut ctx = context(&dir, Arc::new(MockCompiler::new()));
        let handler = Arc::new(RecordingHandler::default());

        PipelineOrchestrator::new(Some(handler.clone()))
            .execute(&mut ctx)
            .await
            .unwrap();

        assert_eq!(
            handler.events(),
            vec![
                "started",
                "start:CompilePhase",
                "done:CompilePhase",
                "start:BundlePhase",
                "done:BundlePhase",
                "start:FanoutPhase",
                "done:FanoutPhase",
                "start:ManifestPhase",
                "done:ManifestPhase",
                "completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_phase_failure_stops_sequence_and_reports() {
        let dir = site();
        let mock = Arc::new(MockCompiler::new());
        mock.fail_scene("boatload");
        let mut ctx = context(&dir, mock);
        let handler = Arc::new(RecordingHandler::default());

        let err = PipelineOrchestrator::new(Some(handler.clone()))
            .execute(&mut ctx)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Phase CompilePhase failed"));

        let events = handler.events();
        assert_eq!(events, vec!["started", "start:CompilePhase", "failed"]);
    }
}
