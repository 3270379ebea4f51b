//! Progress handler trait and events

use std::time::Duration;

/// Events emitted during a build run
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Build started
    Started { site_root: String },

    /// A pipeline phase began
    PhaseStarted { phase: String },

    /// A pipeline phase finished
    PhaseComplete { phase: String, duration: Duration },

    /// One scene finished compiling (or was skipped as fresh)
    SceneCompiled {
        scene_id: String,
        skipped: bool,
        index: usize,
        total: usize,
    },

    /// Build completed successfully
    Completed {
        scenes_built: usize,
        pages_written: usize,
        total_time: Duration,
    },

    /// Build failed
    Failed { error: String },
}

/// Trait for handling progress events during a build
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {
        // Intentionally empty
    }
}
