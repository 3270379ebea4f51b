//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { site_root } => {
                info!(root = %site_root, "Starting build");
            }
            ProgressEvent::PhaseStarted { phase } => {
                info!(phase = %phase, "Starting phase");
            }
            ProgressEvent::PhaseComplete { phase, duration } => {
                info!(
                    phase = %phase,
                    duration_ms = duration.as_millis(),
                    "Phase complete"
                );
            }
            ProgressEvent::SceneCompiled {
                scene_id,
                skipped,
                index,
                total,
            } => {
                if *skipped {
                    debug!(
                        scene = %scene_id,
                        progress = format!("{}/{}", index, total),
                        "Scene up to date"
                    );
                } else {
                    info!(
                        scene = %scene_id,
                        progress = format!("{}/{}", index, total),
                        "Scene compiled"
                    );
                }
            }
            ProgressEvent::Completed {
                scenes_built,
                pages_written,
                total_time,
            } => {
                info!(
                    scenes = scenes_built,
                    pages = pages_written,
                    total_time_ms = total_time.as_millis(),
                    "Build complete"
                );
            }
            ProgressEvent::Failed { error } => {
                warn!(error = %error, "Build failed");
            }
        }
    }
}
